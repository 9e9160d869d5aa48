//! Typed transformation matrices
//!
//! Matrices that map vectors between spaces, with the source and target
//! spaces encoded in the type.

use ::core::marker::PhantomData;
use nalgebra::{RealField, SMatrix, Scalar};

use super::spaces::{
    Innovation, InnovationSpace, Measurement, MeasurementCovariance, MeasurementSpace,
    StateCovariance, StateSpace, StateVector,
};

/// A transformation matrix that maps vectors from one space to another.
///
/// # Type Parameters
///
/// - `T`: Scalar type
/// - `ROWS`: Number of rows (dimension of target space)
/// - `COLS`: Number of columns (dimension of source space)
/// - `To`: Target space marker
/// - `From`: Source space marker
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Transform<T: Scalar, const ROWS: usize, const COLS: usize, To, From> {
    inner: SMatrix<T, ROWS, COLS>,
    _marker: PhantomData<(To, From)>,
}

impl<T: Scalar, const ROWS: usize, const COLS: usize, To, From> Transform<T, ROWS, COLS, To, From> {
    /// Creates a transform from a raw matrix.
    #[inline]
    pub fn from_matrix(inner: SMatrix<T, ROWS, COLS>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying matrix.
    #[inline]
    pub fn as_matrix(&self) -> &SMatrix<T, ROWS, COLS> {
        &self.inner
    }
}

impl<T: Scalar + Copy, const ROWS: usize, const COLS: usize, To: Clone, From: Clone> Copy
    for Transform<T, ROWS, COLS, To, From>
where
    SMatrix<T, ROWS, COLS>: Copy,
{
}

/// State transition matrix: StateSpace -> StateSpace
pub type TransitionMatrix<T, const N: usize> = Transform<T, N, N, StateSpace, StateSpace>;

/// Observation matrix: StateSpace -> MeasurementSpace
pub type ObservationMatrix<T, const M: usize, const N: usize> =
    Transform<T, M, N, MeasurementSpace, StateSpace>;

/// Kalman gain: InnovationSpace -> StateSpace
pub type KalmanGain<T, const N: usize, const M: usize> =
    Transform<T, N, M, StateSpace, InnovationSpace>;

impl<T: RealField + Copy, const N: usize> TransitionMatrix<T, N> {
    /// Applies the transition to a state vector.
    #[inline]
    pub fn apply_state(&self, state: &StateVector<T, N>) -> StateVector<T, N> {
        StateVector::from_svector(self.inner * state.as_svector())
    }

    /// Propagates a covariance matrix: F * P * F^T
    #[inline]
    pub fn propagate_covariance(&self, cov: &StateCovariance<T, N>) -> StateCovariance<T, N> {
        StateCovariance::from_matrix(self.inner * cov.as_matrix() * self.inner.transpose())
    }
}

impl<T: RealField + Copy, const M: usize, const N: usize> ObservationMatrix<T, M, N> {
    /// Applies the observation model to a state vector.
    #[inline]
    pub fn observe(&self, state: &StateVector<T, N>) -> Measurement<T, M> {
        Measurement::from_svector(self.inner * state.as_svector())
    }

    /// Projects state covariance to measurement space: H * P * H^T
    #[inline]
    pub fn project_covariance(&self, cov: &StateCovariance<T, N>) -> MeasurementCovariance<T, M> {
        MeasurementCovariance::from_matrix(self.inner * cov.as_matrix() * self.inner.transpose())
    }
}

impl<T: RealField + Copy, const N: usize, const M: usize> KalmanGain<T, N, M> {
    /// Applies the Kalman gain to an innovation vector.
    #[inline]
    pub fn correct(&self, innovation: &Innovation<T, M>) -> StateVector<T, N> {
        StateVector::from_svector(self.inner * innovation.as_svector())
    }
}

// ============================================================================
// Kalman Gain Computation
// ============================================================================

/// Computes the Kalman gain matrix.
///
/// K = P * H^T * S^{-1}
///
/// Returns `None` when S is singular.
pub fn compute_kalman_gain<T: RealField + Copy, const N: usize, const M: usize>(
    state_cov: &StateCovariance<T, N>,
    obs_matrix: &ObservationMatrix<T, M, N>,
    innovation_cov: &MeasurementCovariance<T, M>,
) -> Option<KalmanGain<T, N, M>> {
    let s_inv = innovation_cov.as_matrix().try_inverse()?;
    let k = state_cov.as_matrix() * obs_matrix.as_matrix().transpose() * s_inv;

    Some(KalmanGain::from_matrix(k))
}

/// Computes the innovation covariance.
///
/// S = H * P * H^T + R
pub fn compute_innovation_covariance<T: RealField + Copy, const N: usize, const M: usize>(
    state_cov: &StateCovariance<T, N>,
    obs_matrix: &ObservationMatrix<T, M, N>,
    meas_noise: &MeasurementCovariance<T, M>,
) -> MeasurementCovariance<T, M> {
    let h_p_ht = obs_matrix.project_covariance(state_cov);
    MeasurementCovariance::from_matrix(h_p_ht.as_matrix() + meas_noise.as_matrix())
}

/// Updates state covariance using Joseph form.
///
/// P_updated = (I - K*H) * P * (I - K*H)^T + K * R * K^T
pub fn joseph_update<T: RealField + Copy, const N: usize, const M: usize>(
    state_cov: &StateCovariance<T, N>,
    kalman_gain: &KalmanGain<T, N, M>,
    obs_matrix: &ObservationMatrix<T, M, N>,
    meas_noise: &MeasurementCovariance<T, M>,
) -> StateCovariance<T, N> {
    let i: SMatrix<T, N, N> = SMatrix::identity();
    let i_kh = i - kalman_gain.as_matrix() * obs_matrix.as_matrix();

    let term1 = i_kh * state_cov.as_matrix() * i_kh.transpose();
    let term2 =
        kalman_gain.as_matrix() * meas_noise.as_matrix() * kalman_gain.as_matrix().transpose();

    StateCovariance::from_matrix(term1 + term2)
}
