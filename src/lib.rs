//! speedtrap: vehicle tracking and speed estimation for fixed traffic cameras
//!
//! Consumes per-frame blob centroids from a detector front-end and turns them
//! into persistent tracks with speed measurements.
//!
//! # Features
//!
//! - **Type Safety**: state, measurement and innovation spaces are distinct
//!   types, so dimension and space mix-ups fail to compile
//! - **Optimal Assignment**: detections are matched to tracks with a gated
//!   Hungarian solver, deterministically on ties
//! - **Line-Crossing Speeds**: each track is timed from birth to a reference
//!   line and flagged above a configurable limit
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use speedtrap::prelude::*;
//!
//! let mut trap = SpeedTrap::new(&Config::default()).unwrap();
//! let report = trap
//!     .process_frame(&[Point2::new(320.0, 40.0)], FrameTiming::at(Duration::ZERO))
//!     .unwrap();
//! assert_eq!(report.update.created.len(), 1);
//! ```

pub mod assignment;
pub mod config;
pub mod filters;
pub mod models;
pub mod pipeline;
pub mod speed;
pub mod tracker;
pub mod types;

pub mod prelude {
    pub use crate::assignment::{AssignmentSolver, Matching};
    pub use crate::config::{
        Config, EstimatorConfig, MotionModelKind, SpeedConfig, StreamConfig, TrackerConfig,
    };
    pub use crate::filters::StateEstimator;
    pub use crate::pipeline::{FrameClock, FrameReport, SpeedTrap};
    pub use crate::speed::{FrameTiming, Speed, SpeedOutcome, SpeedProtocol, UnitSystem};
    pub use crate::tracker::{
        RetireReason, SpeedStatus, Track, TrackId, TrackManager, Trajectory, UpdateSummary,
    };
    pub use crate::types::geometry::{Point2, ReferenceLine};
    pub use crate::{Error, Result};
}

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of range or unrecognised
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A track's position uncertainty exceeded the safety bound
    #[error("estimator for track {id} diverged (position variance {uncertainty:.1})")]
    EstimatorDivergence { id: u64, uncertainty: f64 },
    /// Speed could not be computed for a track
    #[error("speed computation failed for track {id}: {reason}")]
    SpeedComputation { id: u64, reason: String },
    /// Matrix is singular and cannot be inverted
    #[error("matrix is singular")]
    SingularMatrix,
    /// Numerical computation became unstable
    #[error("numerical instability detected")]
    NumericalInstability,
    /// Assignment algorithm failed to find a solution
    #[error("assignment failed: non-finite or malformed cost input")]
    AssignmentFailed,
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
