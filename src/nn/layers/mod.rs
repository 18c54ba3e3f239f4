//! Neural network layers.
//!
//! Every layer implements [`Computable`](super::Computable),
//! [`Trainable`](super::Trainable) and [`Parameterized`](super::Parameterized),
//! so any of them can be boxed into a [`Sequential`](super::Sequential)
//! pipeline or used as a sub-module of a [`DenoisingAutoencoder`].

pub mod autoencoder;
pub mod conv2d;
pub mod dense;
pub mod dropout;
pub mod im2col;
pub mod normaliser;
pub mod params;
pub mod pooling;

pub use autoencoder::{AutoencoderConfig, DenoisingAutoencoder};
pub use conv2d::{get_padded_strided_dimension, ConvGeometry, Convolutional};
pub use dense::Linear;
pub use dropout::Dropout;
pub use normaliser::{Normaliser, NormaliserConfig};
pub use params::ParameterSet;
pub use pooling::Pooling;
