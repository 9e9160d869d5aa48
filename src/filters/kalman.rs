//! Standard Kalman Filter for single-target tracking
//!
//! A type-safe implementation of the discrete-time Kalman filter built on the
//! crate's typed vector spaces.
//!
//! # Example
//!
//! ```
//! use speedtrap::filters::kalman::{KalmanFilter, KalmanState};
//! use speedtrap::models::{ConstantVelocity2D, PositionSensor2D};
//! use speedtrap::types::spaces::{Measurement, StateCovariance, StateVector};
//!
//! let filter = KalmanFilter::new(ConstantVelocity2D::new(1.0), PositionSensor2D::new(1.0));
//!
//! // Initial state: [x, y, vx, vy]
//! let mut state = KalmanState::new(
//!     StateVector::from_array([0.0, 0.0, 1.0, 0.0]),
//!     StateCovariance::from_diagonal(&nalgebra::vector![10.0, 10.0, 1.0, 1.0]),
//! );
//!
//! state = filter.predict(&state, 1.0);
//!
//! let measurement = Measurement::from_array([1.5, 0.2]);
//! if let Some(updated) = filter.update(&state, &measurement) {
//!     state = updated;
//! }
//! ```

use core::marker::PhantomData;

use nalgebra::RealField;
use num_traits::Float;

use crate::models::{ObservationModel, TransitionModel};
use crate::types::spaces::{ComputeInnovation, Measurement, StateCovariance, StateVector};
use crate::types::transforms::{compute_innovation_covariance, compute_kalman_gain, joseph_update};

// ============================================================================
// Kalman Filter State
// ============================================================================

/// State estimate for the Kalman filter: mean and covariance.
///
/// # Type Parameters
///
/// - `T`: Scalar type (typically `f64`)
/// - `N`: State dimension (compile-time constant)
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState<T: RealField, const N: usize> {
    /// State estimate mean
    pub mean: StateVector<T, N>,
    /// State estimate covariance
    pub covariance: StateCovariance<T, N>,
}

impl<T: RealField + Copy, const N: usize> KalmanState<T, N> {
    /// Creates a new Kalman filter state.
    #[inline]
    pub fn new(mean: StateVector<T, N>, covariance: StateCovariance<T, N>) -> Self {
        Self { mean, covariance }
    }

    /// Extracts the first `P` components of the state vector.
    #[inline]
    pub fn position<const P: usize>(&self) -> [T; P] {
        let mut pos = [T::zero(); P];
        for (i, p) in pos.iter_mut().enumerate() {
            *p = *self.mean.index(i);
        }
        pos
    }

    /// True when mean and covariance are free of NaN and infinity.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.covariance.is_finite()
    }
}

// ============================================================================
// Kalman Filter
// ============================================================================

/// A standard discrete-time Kalman filter.
///
/// Combines a transition model (dynamics) with an observation model (sensor).
///
/// # Type Parameters
///
/// - `T`: Scalar type
/// - `Trans`: Transition model type
/// - `Obs`: Observation model type
/// - `N`: State dimension
/// - `M`: Measurement dimension
#[derive(Debug, Clone)]
pub struct KalmanFilter<T, Trans, Obs, const N: usize, const M: usize>
where
    T: RealField,
    Trans: TransitionModel<T, N>,
    Obs: ObservationModel<T, N, M>,
{
    /// Transition (motion) model
    pub transition: Trans,
    /// Observation (sensor) model
    pub observation: Obs,
    _marker: PhantomData<T>,
}

impl<T, Trans, Obs, const N: usize, const M: usize> KalmanFilter<T, Trans, Obs, N, M>
where
    T: RealField + Float + Copy,
    Trans: TransitionModel<T, N>,
    Obs: ObservationModel<T, N, M>,
{
    /// Creates a new Kalman filter with the given models.
    #[inline]
    pub fn new(transition: Trans, observation: Obs) -> Self {
        Self {
            transition,
            observation,
            _marker: PhantomData,
        }
    }

    /// Performs the prediction step.
    ///
    /// - x_pred = F * x
    /// - P_pred = F * P * F^T + Q
    pub fn predict(&self, state: &KalmanState<T, N>, dt: T) -> KalmanState<T, N> {
        let f = self.transition.transition_matrix(dt);
        let q = self.transition.process_noise(dt);

        KalmanState {
            mean: f.apply_state(&state.mean),
            covariance: f.propagate_covariance(&state.covariance).add(&q),
        }
    }

    /// Performs the update step with a measurement.
    ///
    /// - y = z - H * x (innovation)
    /// - S = H * P * H^T + R (innovation covariance)
    /// - K = P * H^T * S^{-1} (Kalman gain)
    /// - x_upd = x + K * y
    /// - P_upd = (I - K*H) * P * (I - K*H)^T + K * R * K^T (Joseph form)
    ///
    /// Returns `None` if the innovation covariance is singular.
    pub fn update(
        &self,
        state: &KalmanState<T, N>,
        measurement: &Measurement<T, M>,
    ) -> Option<KalmanState<T, N>> {
        let h = self.observation.observation_matrix();
        let r = self.observation.measurement_noise();

        let innovation = measurement.innovation(h.observe(&state.mean));
        let innovation_cov = compute_innovation_covariance(&state.covariance, &h, &r);
        let kalman_gain = compute_kalman_gain(&state.covariance, &h, &innovation_cov)?;

        let correction = kalman_gain.correct(&innovation);
        let updated_mean =
            StateVector::from_svector(state.mean.as_svector() + correction.as_svector());
        let updated_cov = joseph_update(&state.covariance, &kalman_gain, &h, &r);

        Some(KalmanState {
            mean: updated_mean,
            covariance: updated_cov,
        })
    }
}
