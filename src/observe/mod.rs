//! Observability hook for the view selectors.
//!
//! Selectors never log directly. Each call reports one [`SelectionEvent`] to
//! the [`SelectionObserver`] passed in by the caller:
//! - [`NoopObserver`] - discards everything (the default)
//! - [`TracingObserver`] - forwards to `tracing`
//! - [`RecordingObserver`] - keeps events in memory (tests, offline analysis)

use parking_lot::Mutex;

use crate::tracks::{FrameIndex, FramePair};

/// Counters and timing of one initialization pair search.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationDiagnostics {
    pub num_frames: usize,
    pub num_points: usize,
    /// Pairs that passed the depth filter and had their covisibility scored.
    pub pairs_scored: usize,
    /// Pairs skipped because their depth/baseline ratio was too large.
    pub pairs_rejected_by_depth: usize,
    /// Pairs whose score cleared the minimum track count.
    pub candidates: usize,
    /// Chosen pair (the default pair on fallback).
    pub pair: FramePair,
    pub depth_ratio: f64,
    /// Winning score, `None` on fallback.
    pub score: Option<usize>,
    pub elapsed_ms: f64,
}

/// Counters and timing of one next-view search.
#[derive(Debug, Clone, PartialEq)]
pub struct NextViewDiagnostics {
    /// Frames still marked as to-process.
    pub frames_considered: usize,
    /// Registered point ids used for scoring (after de-duplication).
    pub registered_points: usize,
    pub duplicates_removed: usize,
    pub frame: Option<FrameIndex>,
    pub match_count: usize,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    InitializationSearched(InitializationDiagnostics),
    NextViewSearched(NextViewDiagnostics),
}

/// Receiver of selection diagnostics.
///
/// Takes `&self` so one observer can be shared across many calls.
pub trait SelectionObserver {
    fn on_event(&self, event: &SelectionEvent);
}

/// Observer that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SelectionObserver for NoopObserver {
    fn on_event(&self, _event: &SelectionEvent) {}
}

/// Observer that logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SelectionObserver for TracingObserver {
    fn on_event(&self, event: &SelectionEvent) {
        match event {
            SelectionEvent::InitializationSearched(d) => match d.score {
                Some(score) => tracing::info!(
                    "Initialization pair {} with {} trackings, depth ratio {:.3} ({} pairs scored, {} rejected by depth, {:.3} ms)",
                    d.pair,
                    score,
                    d.depth_ratio,
                    d.pairs_scored,
                    d.pairs_rejected_by_depth,
                    d.elapsed_ms
                ),
                None => tracing::warn!(
                    "No initialization pair cleared the threshold ({} pairs scored, {} rejected by depth); using default {}",
                    d.pairs_scored,
                    d.pairs_rejected_by_depth,
                    d.pair
                ),
            },
            SelectionEvent::NextViewSearched(d) => match d.frame {
                Some(frame) => tracing::debug!(
                    "Next frame {} with {} common points ({} candidates, {} registered points, {:.3} ms)",
                    frame,
                    d.match_count,
                    d.frames_considered,
                    d.registered_points,
                    d.elapsed_ms
                ),
                None => tracing::warn!(
                    "No next frame shares points with the reconstruction ({} candidates, {} registered points)",
                    d.frames_considered,
                    d.registered_points
                ),
            },
        }
    }
}

/// Observer that stores every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SelectionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far.
    pub fn events(&self) -> Vec<SelectionEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Remove and return all recorded events.
    pub fn take(&self) -> Vec<SelectionEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl SelectionObserver for RecordingObserver {
    fn on_event(&self, event: &SelectionEvent) {
        self.events.lock().push(event.clone());
    }
}
