//! # lattice-core
//!
//! lattice-core is the storage part of the lattice layer engine.
//! It contains the dense three dimensional [`Tensor3`](tensor::Tensor3),
//! the [`Scalar`](scalar::Scalar) element trait, shape arithmetic,
//! [`LatticeError`](error::LatticeError) and runtime [`Config`](config::Config).
//!
#![forbid(unsafe_code)]
#![forbid(rustdoc::broken_intra_doc_links)]
#![forbid(rustdoc::private_intra_doc_links)]
#![forbid(missing_docs)]
#![forbid(rustdoc::missing_crate_level_docs)]
#![forbid(rustdoc::private_doc_tests)]
#![forbid(rustdoc::invalid_codeblock_attributes)]
#![forbid(rustdoc::invalid_html_tags)]
#![forbid(rustdoc::invalid_rust_codeblocks)]
#![forbid(rustdoc::bare_urls)]
#![forbid(rustdoc::unescaped_backticks)]
#![forbid(rustdoc::redundant_explicit_links)]

/// See [Config](config::Config)
pub mod config;
/// See [DType](dtype::DType)
pub mod dtype;
/// See [LatticeError](error::LatticeError)
pub mod error;
/// See [Scalar](scalar::Scalar)
pub mod scalar;
/// See [Dims](shape::Dims)
pub mod shape;
/// See [Tensor3](tensor::Tensor3)
pub mod tensor;

pub use config::Config;
pub use dtype::DType;
pub use error::LatticeError;
pub use scalar::Scalar;
pub use shape::Dims;
pub use tensor::Tensor3;
