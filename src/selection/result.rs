//! Selector outputs.
//!
//! A selector that finds nothing above its threshold does not fail: it
//! returns a documented default together with an explicit marker, and the
//! caller decides whether to abort, relax thresholds or continue degraded.

use crate::tracks::{FrameIndex, FramePair};

/// Whether a selector result is a genuine win or a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    /// A candidate cleared the threshold.
    Selected,
    /// No candidate cleared the threshold; the value is the documented default.
    Fallback,
}

/// Frame pair chosen to bootstrap the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitializationPair {
    pub pair: FramePair,
    /// Depth/baseline ratio of `pair`, used as the initial scene depth.
    pub depth_ratio: f64,
    /// Track-length weighted covisibility of the pair. `None` on fallback.
    pub score: Option<usize>,
    pub status: SelectionStatus,
}

impl InitializationPair {
    pub fn is_selected(&self) -> bool {
        self.status == SelectionStatus::Selected
    }

    /// The two frames as `(newer, older)`.
    pub fn frames(&self) -> (FrameIndex, FrameIndex) {
        (self.pair.newer(), self.pair.older())
    }
}

/// Outcome of one next-view search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextView {
    /// Frame with the most registered points in view.
    Found { frame: FrameIndex, match_count: usize },
    /// No pending frame sees any registered point.
    NoCandidate,
}

impl NextView {
    pub fn frame(&self) -> Option<FrameIndex> {
        match self {
            Self::Found { frame, .. } => Some(*frame),
            Self::NoCandidate => None,
        }
    }

    pub fn match_count(&self) -> usize {
        match self {
            Self::Found { match_count, .. } => *match_count,
            Self::NoCandidate => 0,
        }
    }
}
