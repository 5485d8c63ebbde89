//! RegistrationSession - frame states and reconstructed points of one
//! incremental reconstruction.
//!
//! The session drives the two selectors and owns the state they only read:
//! - the per-frame [`FrameState`]
//! - the reconstructed point ids, in order of reconstruction
//!
//! Registration itself (pose estimation, triangulation) happens elsewhere.
//! [`RegistrationSession::register`] only records its visible effect: a point
//! counts as reconstructed once two registered frames observe it.

use crate::config::ViewSelectionConfig;
use crate::error::{Result, SelectionError};
use crate::observe::SelectionObserver;
use crate::selection::{
    FrameState, InitializationPair, InitializationSelector, NextView, NextViewSelector,
};
use crate::tracks::{FrameIndex, FramePairGraph, PointId, TrackMatrix};

/// Registered frames needed before a point is triangulated.
const MIN_VIEWS_PER_POINT: usize = 2;

pub struct RegistrationSession<'a> {
    tracks: &'a TrackMatrix,
    graph: &'a FramePairGraph,
    initialization: InitializationSelector,
    next_view: NextViewSelector,

    states: Vec<FrameState>,

    /// Number of registered frames observing each point.
    registered_views: Vec<usize>,

    /// Reconstructed point ids, oldest first.
    reconstructed: Vec<PointId>,
}

impl<'a> RegistrationSession<'a> {
    pub fn new(tracks: &'a TrackMatrix, graph: &'a FramePairGraph, config: &ViewSelectionConfig) -> Self {
        Self {
            tracks,
            graph,
            initialization: InitializationSelector::new(config.initialization.clone()),
            next_view: NextViewSelector::new(config.next_view.clone()),
            states: vec![FrameState::Unregistered; tracks.num_frames()],
            registered_views: vec![0; tracks.num_points()],
            reconstructed: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Pick the initialization pair and mark both frames as seeds.
    ///
    /// A fallback pair is marked as well; check
    /// [`InitializationPair::is_selected`] to decide whether to go on.
    pub fn initialize(&mut self, observer: &dyn SelectionObserver) -> Result<InitializationPair> {
        let init = self.initialization.select(self.tracks, self.graph, observer)?;
        let (newer, older) = init.frames();

        for frame in [newer, older] {
            let state = self.states[frame.index()];
            if !state.is_pending() {
                return Err(SelectionError::InvalidTransition {
                    frame,
                    from: state,
                    to: FrameState::Seed,
                });
            }
        }
        self.states[newer.index()] = FrameState::Seed;
        self.states[older.index()] = FrameState::Seed;

        Ok(init)
    }

    /// Pick the next frame among the unregistered ones and mark it.
    pub fn select_next(&mut self, observer: &dyn SelectionObserver) -> Result<NextView> {
        let pending = self.frames_to_process();
        let next = self
            .next_view
            .select(self.tracks, &pending, &self.reconstructed, observer)?;

        if let NextView::Found { frame, .. } = next {
            self.states[frame.index()] = FrameState::SelectedNext;
        }
        Ok(next)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Mark a selected frame as registered.
    ///
    /// Only seeds and frames returned by [`Self::select_next`] can be
    /// registered. Returns the points that became reconstructed.
    pub fn register(&mut self, frame: FrameIndex) -> Result<Vec<PointId>> {
        self.tracks.check_frame(frame)?;
        let state = self.states[frame.index()];
        if !state.awaits_registration() {
            return Err(SelectionError::InvalidTransition {
                frame,
                from: state,
                to: FrameState::Registered,
            });
        }
        self.states[frame.index()] = FrameState::Registered;

        let mut new_points = Vec::new();
        for point in self.tracks.frame_points(frame) {
            let views = &mut self.registered_views[point.index()];
            *views += 1;
            if *views == MIN_VIEWS_PER_POINT {
                new_points.push(point);
            }
        }
        self.reconstructed.extend_from_slice(&new_points);

        Ok(new_points)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn state(&self, frame: FrameIndex) -> Option<FrameState> {
        self.states.get(frame.index()).copied()
    }

    pub fn states(&self) -> &[FrameState] {
        &self.states
    }

    /// One flag per frame, `true` for frames not yet picked.
    pub fn frames_to_process(&self) -> Vec<bool> {
        self.states.iter().map(|s| s.is_pending()).collect()
    }

    pub fn reconstructed_points(&self) -> &[PointId] {
        &self.reconstructed
    }

    pub fn num_registered(&self) -> usize {
        self.states
            .iter()
            .filter(|&&s| s == FrameState::Registered)
            .count()
    }
}
