//! Observation (detector) models
//!
//! Describes how blob centroids relate to the tracked state.

use nalgebra::RealField;
use num_traits::Float;

use crate::types::spaces::MeasurementCovariance;
use crate::types::transforms::ObservationMatrix;

/// Trait for linear observation models.
///
/// Describes the measurement process:
/// z = H * x + v
///
/// where:
/// - H is the observation matrix
/// - v is zero-mean Gaussian measurement noise with covariance R
pub trait ObservationModel<T: RealField, const N: usize, const M: usize> {
    /// Returns the observation matrix.
    fn observation_matrix(&self) -> ObservationMatrix<T, M, N>;

    /// Returns the measurement noise covariance.
    fn measurement_noise(&self) -> MeasurementCovariance<T, M>;
}

/// Position-only sensor in 2D.
///
/// Observes [x, y] from state [x, y, vx, vy]. Blob centroids from the
/// background-subtraction front-end are exactly this.
#[derive(Debug, Clone)]
pub struct PositionSensor2D<T: RealField> {
    /// Position measurement noise standard deviation
    pub sigma_pos: T,
}

impl<T: RealField + Float + Copy> PositionSensor2D<T> {
    /// Creates a new position sensor.
    ///
    /// # Panics
    /// Panics if `sigma_pos <= 0`.
    pub fn new(sigma_pos: T) -> Self {
        assert!(
            sigma_pos > T::zero(),
            "Measurement noise sigma_pos must be positive"
        );
        Self { sigma_pos }
    }
}

impl<T: RealField + Float + Copy> ObservationModel<T, 4, 2> for PositionSensor2D<T> {
    fn observation_matrix(&self) -> ObservationMatrix<T, 2, 4> {
        let one = T::one();
        let zero = T::zero();

        ObservationMatrix::from_matrix(nalgebra::matrix![
            one, zero, zero, zero;
            zero, one, zero, zero
        ])
    }

    fn measurement_noise(&self) -> MeasurementCovariance<T, 2> {
        let sigma_sq = self.sigma_pos * self.sigma_pos;
        let zero = T::zero();

        MeasurementCovariance::from_matrix(nalgebra::matrix![
            sigma_sq, zero;
            zero, sigma_sq
        ])
    }
}
