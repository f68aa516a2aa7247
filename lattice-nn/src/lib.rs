//! Layer graph for the lattice engine.
//!
//! A [`Network`] owns a chain of layers in an arena. Every layer owns its
//! output [`Tensor3`](lattice_core::Tensor3) and reads the output of its
//! input layer by [`LayerId`].
//!
//! ```
//! use lattice_core::{Config, Tensor3};
//! use lattice_nn::{Layer, Network};
//!
//! let mut net = Network::<f32>::new(Config::sequential());
//! let x = net.add_input((5, 5, 1))?;
//! let conv = net.add_convolution(x, 1, 3, 1, 0)?;
//! assert_eq!(net.layer(conv)?.dims(), (3, 3, 1));
//! net.set_input(x, &Tensor3::from_vec((5, 5, 1), vec![1.; 25])?)?;
//! net.layer_mut(conv)?.as_convolution_mut().unwrap().filters_mut()[0].fill(1.);
//! net.forward()?;
//! assert!(net.output(conv)?.iter().all(|&v| v == 9.));
//! # Ok::<(), lattice_core::LatticeError>(())
//! ```

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

mod layer;
pub use layer::{Layer, LayerId};

mod weights;

mod input;
pub use input::InputLayer;

mod convolution;
pub use convolution::ConvolutionLayer;

mod fully_connected;
pub use fully_connected::FullyConnectedLayer;

mod node;
pub use node::Node;

mod network;
pub use network::Network;
