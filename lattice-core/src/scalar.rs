use crate::dtype::DType;

/// Scalar trait is implemented for all [dtypes](DType)
///
/// Arithmetic goes through the trait methods so that kernels spell out
/// their accumulation order explicitly.
pub trait Scalar:
    Copy + PartialEq + PartialOrd + Default + core::fmt::Debug + core::fmt::Display + Send + Sync + 'static
{
    /// From f64
    fn from_f64(t: f64) -> Self;
    /// Get dtype of Self
    fn dtype() -> DType;
    /// Get zero of Self
    fn zero() -> Self;
    /// Add
    fn add(self, rhs: Self) -> Self;
    /// Mul
    fn mul(self, rhs: Self) -> Self;
}

impl Scalar for f32 {
    fn from_f64(t: f64) -> Self {
        t as f32
    }

    fn dtype() -> DType {
        DType::F32
    }

    fn zero() -> Self {
        0.
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
}

impl Scalar for f64 {
    fn from_f64(t: f64) -> Self {
        t
    }

    fn dtype() -> DType {
        DType::F64
    }

    fn zero() -> Self {
        0.
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
}
