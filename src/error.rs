//! Structural errors raised by the track structures and the view selectors.
//!
//! Scoring failures are not errors: the selectors encode them in their
//! return values (see [`crate::selection::SelectionStatus`] and
//! [`crate::selection::NextView`]).

use thiserror::Error;

use crate::selection::FrameState;
use crate::tracks::{FrameIndex, PointId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    /// Row/column counts disagree with the declared shape.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Initialization needs at least two frames.
    #[error("initialization needs at least 2 frames, found {found}")]
    InsufficientFrames { found: usize },

    #[error("frame {frame} out of range for {num_frames} frames")]
    FrameOutOfRange { frame: FrameIndex, num_frames: usize },

    #[error("point {point} out of range for {num_points} points")]
    PointOutOfRange { point: PointId, num_points: usize },

    /// A frame pair was built from the same frame twice.
    #[error("frame pair needs two distinct frames, got {frame} twice")]
    SelfPair { frame: FrameIndex },

    /// A frame state change outside the registration state machine.
    #[error("frame {frame} cannot go from {from} to {to}")]
    InvalidTransition {
        frame: FrameIndex,
        from: FrameState,
        to: FrameState,
    },
}

pub type Result<T> = std::result::Result<T, SelectionError>;
