//! Transition (motion) models for vehicle dynamics in the image plane
//!
//! Describes how a tracked blob evolves between frames.

use nalgebra::RealField;
use num_traits::Float;

use crate::types::spaces::StateCovariance;
use crate::types::transforms::TransitionMatrix;

/// Trait for linear transition (motion) models.
///
/// Describes target dynamics in the form:
/// x_{k+1} = F * x_k + w
///
/// where:
/// - F is the state transition matrix
/// - w is zero-mean Gaussian process noise with covariance Q
pub trait TransitionModel<T: RealField, const N: usize> {
    /// Returns the state transition matrix for time step dt.
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, N>;

    /// Returns the process noise covariance for time step dt.
    fn process_noise(&self, dt: T) -> StateCovariance<T, N>;
}

/// Constant velocity model in 2D.
///
/// State: [x, y, vx, vy]
#[derive(Debug, Clone)]
pub struct ConstantVelocity2D<T: RealField> {
    /// Process noise intensity (acceleration standard deviation)
    pub sigma_a: T,
}

impl<T: RealField + Float + Copy> ConstantVelocity2D<T> {
    /// Creates a new constant velocity model.
    ///
    /// # Panics
    /// Panics if `sigma_a < 0`.
    pub fn new(sigma_a: T) -> Self {
        assert!(
            sigma_a >= T::zero(),
            "Process noise sigma_a must be non-negative"
        );
        Self { sigma_a }
    }
}

impl<T: RealField + Float + Copy> TransitionModel<T, 4> for ConstantVelocity2D<T> {
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, 4> {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        let one = T::one();
        let zero = T::zero();

        TransitionMatrix::from_matrix(nalgebra::matrix![
            one, zero, dt, zero;
            zero, one, zero, dt;
            zero, zero, one, zero;
            zero, zero, zero, one
        ])
    }

    fn process_noise(&self, dt: T) -> StateCovariance<T, 4> {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        let two = T::one() + T::one();
        let four = two * two;

        let sigma_sq = self.sigma_a * self.sigma_a;

        // Discrete white noise acceleration model
        let q11 = dt4 / four * sigma_sq;
        let q13 = dt3 / two * sigma_sq;
        let q33 = dt2 * sigma_sq;

        let zero = T::zero();

        StateCovariance::from_matrix(nalgebra::matrix![
            q11, zero, q13, zero;
            zero, q11, zero, q13;
            q13, zero, q33, zero;
            zero, q13, zero, q33
        ])
    }
}

/// Constant position (random walk) model in 2D.
///
/// Shares the `[x, y, vx, vy]` layout with [`ConstantVelocity2D`] so both can
/// drive the same estimator, but the velocity block is pinned to zero and
/// prediction never extrapolates.
#[derive(Debug, Clone)]
pub struct ConstantPosition2D<T: RealField> {
    /// Position diffusion standard deviation per unit time
    pub sigma_p: T,
}

impl<T: RealField + Float + Copy> ConstantPosition2D<T> {
    /// # Panics
    /// Panics if `sigma_p < 0`.
    pub fn new(sigma_p: T) -> Self {
        assert!(
            sigma_p >= T::zero(),
            "Process noise sigma_p must be non-negative"
        );
        Self { sigma_p }
    }
}

impl<T: RealField + Float + Copy> TransitionModel<T, 4> for ConstantPosition2D<T> {
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, 4> {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        let one = T::one();
        let zero = T::zero();

        TransitionMatrix::from_matrix(nalgebra::matrix![
            one, zero, zero, zero;
            zero, one, zero, zero;
            zero, zero, zero, zero;
            zero, zero, zero, zero
        ])
    }

    fn process_noise(&self, dt: T) -> StateCovariance<T, 4> {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        let q = self.sigma_p * self.sigma_p * dt;
        let zero = T::zero();

        StateCovariance::from_diagonal(&nalgebra::vector![q, q, zero, zero])
    }
}

/// Runtime-selected motion model for the per-track estimator.
#[derive(Debug, Clone)]
pub enum MotionModel {
    ConstantVelocity(ConstantVelocity2D<f64>),
    ConstantPosition(ConstantPosition2D<f64>),
}

impl TransitionModel<f64, 4> for MotionModel {
    fn transition_matrix(&self, dt: f64) -> TransitionMatrix<f64, 4> {
        match self {
            MotionModel::ConstantVelocity(m) => m.transition_matrix(dt),
            MotionModel::ConstantPosition(m) => m.transition_matrix(dt),
        }
    }

    fn process_noise(&self, dt: f64) -> StateCovariance<f64, 4> {
        match self {
            MotionModel::ConstantVelocity(m) => m.process_noise(dt),
            MotionModel::ConstantPosition(m) => m.process_noise(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::spaces::StateVector;

    #[test]
    fn test_constant_velocity_extrapolates() {
        let model = ConstantVelocity2D::new(1.0_f64);
        let f = model.transition_matrix(1.0);
        let next = f.apply_state(&StateVector::from_array([10.0, 10.0, 2.0, -1.0]));

        assert!((next.index(0) - 12.0).abs() < 1e-10);
        assert!((next.index(1) - 9.0).abs() < 1e-10);
        assert!((next.index(2) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_velocity_noise_is_symmetric() {
        let model = ConstantVelocity2D::new(2.0_f64);
        let q = model.process_noise(1.0);
        let m = q.as_matrix();

        assert!((m - m.transpose()).norm() < 1e-12);
        // sigma^2 * dt^4 / 4
        assert!((m[(0, 0)] - 1.0).abs() < 1e-12);
        // sigma^2 * dt^2
        assert!((m[(2, 2)] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_position_holds_still() {
        let model = ConstantPosition2D::new(1.0_f64);
        let f = model.transition_matrix(1.0);
        let next = f.apply_state(&StateVector::from_array([10.0, 20.0, 5.0, 5.0]));

        assert!((next.index(0) - 10.0).abs() < 1e-10);
        assert!((next.index(1) - 20.0).abs() < 1e-10);
        assert!(next.index(2).abs() < 1e-10);
        assert!(next.index(3).abs() < 1e-10);
    }

    #[test]
    fn test_motion_model_dispatch() {
        let cv = MotionModel::ConstantVelocity(ConstantVelocity2D::new(1.0));
        let cp = MotionModel::ConstantPosition(ConstantPosition2D::new(1.0));
        let x = StateVector::from_array([0.0, 0.0, 3.0, 4.0]);

        assert!((cv.transition_matrix(1.0).apply_state(&x).index(0) - 3.0).abs() < 1e-12);
        assert!(cp.transition_matrix(1.0).apply_state(&x).index(0).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_negative_noise_rejected() {
        let _ = ConstantVelocity2D::new(-1.0_f64);
    }
}
