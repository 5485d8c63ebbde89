//! View selection for incremental reconstruction.
//!
//! - [`InitializationSelector`] - picks the bootstrap frame pair (runs once)
//! - [`NextViewSelector`] - picks the next frame to register (runs per step)
//!
//! Both are read-only queries over caller-owned state. Their tie-breaks
//! differ: the initialization search keeps the *last* best pair (`>=`), the
//! next-view search keeps the *first* best frame (`>`).

pub mod initialization;
pub mod next_view;
pub mod result;
pub mod state;

pub use initialization::{select_initialization_pair, InitializationSelector};
pub use next_view::{select_next_frame, NextViewSelector};
pub use result::{InitializationPair, NextView, SelectionStatus};
pub use state::FrameState;
