//! # Neurust
//!
//! A small feed-forward neural network compute engine.
//!
//! Layers own their buffers, are evaluated one sample at a time and accumulate
//! parameter gradients across backward calls until the caller installs new
//! parameters. Convolution and max pooling are built on an im2col row expansion
//! of `[height, width, channels]` inputs.
//!
//! ```
//! use neurust::nn::{Computable, Linear, Sequential, Softmax, Trainable};
//! use neurust::tensor;
//!
//! # fn main() -> neurust::Result<()> {
//! let linear = Linear::from_parameters(
//!     tensor!([[1.0, 0.0], [0.0, 1.0]]),
//!     tensor!([0.0, 0.0]),
//! )?;
//! let mut model = Sequential::new().add(linear).add(Softmax::new(2));
//!
//! let input = tensor!([1.0, 1.0]);
//! let out = model.forward(&input)?.to_vec();
//! assert!((out[0] - 0.5).abs() < 1e-6);
//!
//! model.backward(&input, &tensor!([1.0, -1.0]))?;
//! assert_eq!(model.input_gradient().len(), 2);
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod dimension;
pub mod error;
pub mod linalg;
pub mod nn;
pub mod ops;
pub mod tensor;
pub mod view;

pub use error::{NeurustError, Result};
pub use tensor::Tensor;
