//! Vector space markers and typed vectors
//!
//! Typed vectors that cannot be accidentally mixed across the spaces used by
//! the estimator (state, measurement, innovation).

use ::core::marker::PhantomData;
use ::core::ops::{Add, Sub};
use nalgebra::{RealField, SMatrix, SVector, Scalar};

// ============================================================================
// Vector Space Markers
// ============================================================================

/// Marker type for state space vectors (position, velocity)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace;

/// Marker type for measurement space vectors (detector centroids)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSpace;

/// Marker type for innovation vectors (measurement - predicted measurement)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnovationSpace;

// ============================================================================
// Typed Vector
// ============================================================================

/// A vector parameterized by scalar type, dimension, and mathematical space.
///
/// # Type Parameters
///
/// - `T`: The scalar type (typically `f64`)
/// - `N`: The dimension of the vector (const generic)
/// - `Space`: A marker type indicating which space this vector belongs to
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T: Scalar, const N: usize, Space> {
    inner: SVector<T, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Vector<T, N, Space> {
    /// Creates a new vector from raw components.
    #[inline]
    pub fn from_array(data: [T; N]) -> Self {
        Self {
            inner: SVector::from(data),
            _marker: PhantomData,
        }
    }

    /// Creates a new vector from an nalgebra SVector.
    #[inline]
    pub fn from_svector(inner: SVector<T, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying nalgebra vector.
    #[inline]
    pub fn as_svector(&self) -> &SVector<T, N> {
        &self.inner
    }

    /// Access element at index (unchecked).
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, index: usize) -> &T {
        &self.inner[index]
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Vector<T, N, Space> {}

impl<T: RealField + Copy, const N: usize, Space> Vector<T, N, Space> {
    /// True when every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|x| x.is_finite())
    }
}

/// A state vector in state space.
pub type StateVector<T, const N: usize> = Vector<T, N, StateSpace>;

/// A measurement vector in measurement space.
pub type Measurement<T, const M: usize> = Vector<T, M, MeasurementSpace>;

/// An innovation vector (measurement residual) in innovation space.
pub type Innovation<T, const M: usize> = Vector<T, M, InnovationSpace>;

impl<T: RealField + Copy, const N: usize, Space> Add for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner + rhs.inner,
            _marker: PhantomData,
        }
    }
}

impl<T: RealField + Copy, const N: usize, Space> Sub for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner - rhs.inner,
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Measurement - Measurement = Innovation
// ============================================================================

/// Computes the innovation (residual) between two measurements.
///
/// Subtracting two measurements produces an innovation vector, not another
/// measurement, so this is kept out of `Sub`.
pub trait ComputeInnovation<T: RealField, const M: usize> {
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M>;
}

impl<T: RealField + Copy, const M: usize> ComputeInnovation<T, M> for Measurement<T, M> {
    #[inline]
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M> {
        Innovation {
            inner: self.inner - predicted.inner,
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Covariance Matrix
// ============================================================================

/// A covariance matrix bound to a specific vector space.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance<T: Scalar, const N: usize, Space> {
    inner: SMatrix<T, N, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Covariance<T, N, Space> {
    /// Creates a covariance matrix from a raw matrix.
    ///
    /// The caller should ensure the matrix is symmetric and positive semi-definite.
    #[inline]
    pub fn from_matrix(inner: SMatrix<T, N, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying matrix.
    #[inline]
    pub fn as_matrix(&self) -> &SMatrix<T, N, N> {
        &self.inner
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Covariance<T, N, Space> where
    SMatrix<T, N, N>: Copy
{
}

impl<T: RealField + Copy, const N: usize, Space> Covariance<T, N, Space> {
    /// Creates a diagonal covariance matrix.
    #[inline]
    pub fn from_diagonal(diag: &SVector<T, N>) -> Self {
        Self {
            inner: SMatrix::from_diagonal(diag),
            _marker: PhantomData,
        }
    }

    /// Adds two covariance matrices.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            inner: self.inner + other.inner,
            _marker: PhantomData,
        }
    }

    /// Sum of the first `k` diagonal entries.
    ///
    /// With the `[x, y, vx, vy]` layout, `partial_trace(2)` is the positional
    /// variance.
    #[inline]
    pub fn partial_trace(&self, k: usize) -> T {
        let mut sum = T::zero();
        for i in 0..k.min(N) {
            sum += self.inner[(i, i)];
        }
        sum
    }

    /// True when every entry is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|x| x.is_finite())
    }
}

/// Covariance matrix in state space.
pub type StateCovariance<T, const N: usize> = Covariance<T, N, StateSpace>;

/// Covariance matrix in measurement space.
///
/// The innovation covariance S = H*P*H' + R is also carried in this type.
pub type MeasurementCovariance<T, const M: usize> = Covariance<T, M, MeasurementSpace>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_vector_operations() {
        let v1: StateVector<f64, 4> = StateVector::from_array([1.0, 2.0, 3.0, 4.0]);
        let v2: StateVector<f64, 4> = StateVector::from_array([0.5, 1.0, 1.5, 2.0]);

        let sum = v1 + v2;
        assert!((sum.index(0) - 1.5).abs() < 1e-10);
        assert!((sum.index(1) - 3.0).abs() < 1e-10);

        let diff = v1 - v2;
        assert!((diff.index(3) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_measurement_to_innovation() {
        let actual: Measurement<f64, 2> = Measurement::from_array([10.0, 20.0]);
        let predicted: Measurement<f64, 2> = Measurement::from_array([9.5, 19.0]);

        let innovation = actual.innovation(predicted);
        assert!((innovation.index(0) - 0.5).abs() < 1e-10);
        assert!((innovation.index(1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_partial_trace() {
        let cov: StateCovariance<f64, 4> =
            StateCovariance::from_diagonal(&nalgebra::vector![3.0, 4.0, 10.0, 10.0]);
        assert!((cov.partial_trace(4) - 27.0).abs() < 1e-10);
        assert!((cov.partial_trace(2) - 7.0).abs() < 1e-10);
        assert!((cov.partial_trace(9) - 27.0).abs() < 1e-10);
    }

    #[test]
    fn test_non_finite_detection() {
        let v: Measurement<f64, 2> = Measurement::from_array([f64::NAN, 1.0]);
        assert!(!v.is_finite());
        assert!(Measurement::<f64, 2>::from_array([0.0, -1.0]).is_finite());
    }
}
