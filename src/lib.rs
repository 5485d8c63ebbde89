pub mod config;
pub mod error;
pub mod io;
pub mod observe;
pub mod selection;
pub mod system;
pub mod tracks;

pub use error::{Result, SelectionError};
