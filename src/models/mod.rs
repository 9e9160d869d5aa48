//! Model traits for vehicle tracking
//!
//! Target dynamics and detector characteristics used by the per-track
//! estimator.

mod observation;
mod transition;

pub use observation::*;
pub use transition::*;
