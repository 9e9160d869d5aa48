//! State estimation filters
//!
//! - [`kalman::KalmanFilter`]: Standard linear Kalman filter
//! - [`estimator::StateEstimator`]: per-track predict/correct wrapper used by
//!   the track manager

pub mod estimator;
pub mod kalman;

pub use estimator::StateEstimator;
