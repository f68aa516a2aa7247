use crate::shape::Dims;
use std::fmt::Write;

/// Errors that can occur within lattice.
///
/// None of these are transient. Each one signals a programming or
/// configuration mistake and is reported as soon as it is detected.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    /// Checked 3D access outside of declared dimensions
    #[error("index {index:?} out of bounds for tensor with dims {dims:?}")]
    IndexOutOfBounds {
        /// Requested (x, y, z) index
        index: Dims,
        /// Tensor dimensions
        dims: Dims,
    },
    /// Checked flat access past the end of the tensor
    #[error("flat index {index} out of bounds, tensor holds {len} elements")]
    FlatIndexOutOfBounds {
        /// Requested flat index
        index: usize,
        /// Number of elements in the tensor
        len: usize,
    },
    /// Shapes of operands do not agree, or shape arithmetic overflowed
    #[error("shape error: {0}")]
    ShapeError(Box<str>),
    /// Layer hyperparameters violate a construction precondition
    #[error("invalid configuration: {0}")]
    ConfigError(Box<str>),
    /// Layer id does not name a layer in the network
    #[error("invalid layer id {id}, network has {len} layers")]
    InvalidLayer {
        /// Requested layer id
        id: usize,
        /// Number of layers in the network
        len: usize,
    },
    /// Error parsing configuration
    #[error("parse error: {0}")]
    ParseError(Box<str>),
    /// Error from file operations
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
}

impl LatticeError {
    /// Shape error, tagged with the caller's location
    #[track_caller]
    #[must_use]
    pub fn shape_error(e: impl Into<String>) -> Self {
        Self::ShapeError(with_location(e.into()))
    }

    /// Configuration error, tagged with the caller's location
    #[track_caller]
    #[must_use]
    pub fn config_error(e: impl Into<String>) -> Self {
        Self::ConfigError(with_location(e.into()))
    }

    /// Parse error, tagged with the caller's location
    #[track_caller]
    #[must_use]
    pub fn parse_error(e: impl Into<String>) -> Self {
        Self::ParseError(with_location(e.into()))
    }
}

#[track_caller]
fn with_location(mut e: String) -> Box<str> {
    let location = std::panic::Location::caller();
    // Writing into a String cannot fail.
    let _ = write!(e, ", {}:{}:{}", location.file(), location.line(), location.column());
    e.into()
}
