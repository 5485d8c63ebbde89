//! Scene loading and plan export.

pub mod scene;

pub use scene::{write_plan_csv, Scene};
