//! Registration driver built on the view selectors.
//!
//! This module contains the [`RegistrationSession`], which tracks frame
//! states and reconstructed points across selector calls, and the
//! [`RegistrationPlanner`], which runs a session to completion to produce a
//! full registration order.

mod planner;
mod session;

pub use planner::{PlannedStep, RegistrationPlan, RegistrationPlanner, StepRole};
pub use session::RegistrationSession;
