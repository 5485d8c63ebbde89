//! Registration state of a frame during incremental reconstruction.

/// Where a frame stands in the reconstruction.
///
/// Transitions: `Unregistered → Seed → Registered` for the two
/// initialization frames, `Unregistered → SelectedNext → Registered` for
/// every other frame. The selectors only read states; the reconstruction
/// loop performs the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Not yet part of the reconstruction.
    #[default]
    Unregistered,
    /// Picked as one of the two initialization frames.
    Seed,
    /// Picked by the next-view selector, waiting for registration.
    SelectedNext,
    /// Pose estimated and points triangulated.
    Registered,
}

impl FrameState {
    /// Whether the frame is still a candidate for the next-view selector.
    pub fn is_pending(self) -> bool {
        self == Self::Unregistered
    }

    /// Whether the frame was picked and may now be registered.
    pub fn awaits_registration(self) -> bool {
        matches!(self, Self::Seed | Self::SelectedNext)
    }
}

impl std::fmt::Display for FrameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::Seed => "seed",
            Self::SelectedNext => "selected-next",
            Self::Registered => "registered",
        };
        f.write_str(name)
    }
}
