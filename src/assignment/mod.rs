//! Assignment problem solvers
//!
//! Optimal assignment between track predictions and frame detections.

pub mod hungarian;
pub mod solver;

pub use hungarian::*;
pub use solver::*;
