//! Multi-object track management
//!
//! - [`track::Track`]: one tracked vehicle with its estimator and trajectory
//! - [`manager::TrackManager`]: per-frame predict/assign/correct/retire/create

pub mod manager;
pub mod track;

pub use manager::{RetireReason, TrackManager, UpdateSummary};
pub use track::{SpeedStatus, Track, TrackId, Trajectory};
