//! Per-track state estimator
//!
//! Wraps a [`KalmanFilter`] over `[x, y, vx, vy]` with a position-only sensor
//! and owns the track's [`KalmanState`]. One instance per tracked vehicle;
//! never shared.

use crate::config::{EstimatorConfig, MotionModelKind};
use crate::filters::kalman::{KalmanFilter, KalmanState};
use crate::models::{ConstantPosition2D, ConstantVelocity2D, MotionModel, PositionSensor2D};
use crate::types::geometry::Point2;
use crate::types::spaces::{StateCovariance, StateVector};
use crate::{Error, Result};

type BlobFilter = KalmanFilter<f64, MotionModel, PositionSensor2D<f64>, 4, 2>;

/// Predict/correct estimator for one tracked blob.
#[derive(Debug, Clone)]
pub struct StateEstimator {
    filter: BlobFilter,
    state: KalmanState<f64, 4>,
    dt: f64,
}

impl StateEstimator {
    /// Starts an estimator at `position` with zero velocity and the configured
    /// initial covariance.
    pub fn new(position: Point2, config: &EstimatorConfig) -> Self {
        let motion = match config.motion_model {
            MotionModelKind::ConstantVelocity => {
                MotionModel::ConstantVelocity(ConstantVelocity2D::new(config.process_noise))
            }
            MotionModelKind::ConstantPosition => {
                MotionModel::ConstantPosition(ConstantPosition2D::new(config.process_noise))
            }
        };
        let sensor = PositionSensor2D::new(config.measurement_noise);

        let pv = config.initial_position_variance;
        let vv = match config.motion_model {
            MotionModelKind::ConstantVelocity => config.initial_velocity_variance,
            MotionModelKind::ConstantPosition => 0.0,
        };
        let state = KalmanState::new(
            StateVector::from_array([position.x, position.y, 0.0, 0.0]),
            StateCovariance::from_diagonal(&nalgebra::vector![pv, pv, vv, vv]),
        );

        Self {
            filter: KalmanFilter::new(motion, sensor),
            state,
            dt: config.dt,
        }
    }

    /// Advances the state by one frame and returns the predicted position.
    ///
    /// Must be called exactly once per frame, matched or not.
    pub fn predict(&mut self) -> Point2 {
        self.state = self.filter.predict(&self.state, self.dt);
        self.position()
    }

    /// Fuses an observed detection into the state and returns the corrected
    /// position.
    ///
    /// Only valid after [`predict`](Self::predict) in the same frame. On
    /// failure the state is left at the prediction.
    pub fn correct(&mut self, observed: Point2) -> Result<Point2> {
        let updated = self
            .filter
            .update(&self.state, &observed.to_measurement())
            .ok_or(Error::SingularMatrix)?;
        if !updated.is_finite() {
            return Err(Error::NumericalInstability);
        }
        self.state = updated;
        Ok(self.position())
    }

    /// Current position estimate.
    pub fn position(&self) -> Point2 {
        let [x, y] = self.state.position::<2>();
        Point2::new(x, y)
    }

    /// Current velocity estimate in pixels per frame step.
    pub fn velocity(&self) -> Point2 {
        Point2::new(*self.state.mean.index(2), *self.state.mean.index(3))
    }

    /// Sum of the x and y position variances.
    pub fn position_uncertainty(&self) -> f64 {
        self.state.covariance.partial_trace(2)
    }

    /// True when the positional uncertainty has grown past `max_position_variance`
    /// or the state is no longer finite.
    pub fn is_diverged(&self, max_position_variance: f64) -> bool {
        !self.state.is_finite() || self.position_uncertainty() > max_position_variance
    }

    /// Read-only view of the filter state.
    pub fn state(&self) -> &KalmanState<f64, 4> {
        &self.state
    }
}
