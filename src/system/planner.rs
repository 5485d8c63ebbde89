//! RegistrationPlanner - offline registration order for a whole scene.
//!
//! Runs a [`RegistrationSession`] to completion: initialization pair first,
//! then next-view selection and registration until no pending frame sees a
//! reconstructed point.

use crate::config::ViewSelectionConfig;
use crate::error::Result;
use crate::observe::SelectionObserver;
use crate::selection::{FrameState, InitializationPair, NextView};
use crate::tracks::{FrameIndex, FramePairGraph, TrackMatrix};

use super::session::RegistrationSession;

/// Why a frame entered the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRole {
    Seed,
    Next,
}

impl StepRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Next => "next",
        }
    }
}

/// One registration in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub frame: FrameIndex,
    pub role: StepRole,
    /// Reconstructed points seen by the frame when it was selected (0 for seeds).
    pub match_count: usize,
    /// Points reconstructed by registering this frame.
    pub new_points: usize,
}

/// Complete registration order of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationPlan {
    pub initialization: InitializationPair,
    pub steps: Vec<PlannedStep>,
    /// Frames that never shared a point with the reconstruction.
    pub unreachable: Vec<FrameIndex>,
    pub reconstructed_points: usize,
}

impl RegistrationPlan {
    /// Registered frames in order.
    pub fn order(&self) -> Vec<FrameIndex> {
        self.steps.iter().map(|s| s.frame).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationPlanner {
    config: ViewSelectionConfig,
}

impl RegistrationPlanner {
    pub fn new(config: ViewSelectionConfig) -> Self {
        Self { config }
    }

    /// Plan the registration order of every reachable frame.
    ///
    /// A fallback initialization pair is used as is; the plan keeps the
    /// fallback status so the caller can reject it.
    pub fn plan(
        &self,
        tracks: &TrackMatrix,
        graph: &FramePairGraph,
        observer: &dyn SelectionObserver,
    ) -> Result<RegistrationPlan> {
        let mut session = RegistrationSession::new(tracks, graph, &self.config);
        let initialization = session.initialize(observer)?;

        let mut steps = Vec::with_capacity(tracks.num_frames());
        let (newer, older) = initialization.frames();
        for frame in [newer, older] {
            let new_points = session.register(frame)?;
            steps.push(PlannedStep {
                frame,
                role: StepRole::Seed,
                match_count: 0,
                new_points: new_points.len(),
            });
        }
        tracing::debug!(
            "Seeded with {} and {}: {} points",
            newer,
            older,
            session.reconstructed_points().len()
        );

        while let NextView::Found { frame, match_count } = session.select_next(observer)? {
            let new_points = session.register(frame)?;
            tracing::debug!(
                "Registered {} ({} common points, {} new points)",
                frame,
                match_count,
                new_points.len()
            );
            steps.push(PlannedStep {
                frame,
                role: StepRole::Next,
                match_count,
                new_points: new_points.len(),
            });
        }

        let unreachable: Vec<FrameIndex> = session
            .states()
            .iter()
            .enumerate()
            .filter(|&(_, &state)| state == FrameState::Unregistered)
            .map(|(i, _)| FrameIndex::new(i))
            .collect();

        Ok(RegistrationPlan {
            initialization,
            steps,
            unreachable,
            reconstructed_points: session.reconstructed_points().len(),
        })
    }
}
