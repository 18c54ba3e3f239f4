//! Weight initialization functions for neural network layers.
//!
//! Every initializer draws from a caller-supplied random number generator, so a
//! seeded `StdRng` gives reproducible weights.
//!
//! # Available Initialization Strategies
//! - `uniform_init`: values from a uniform distribution
//! - `normal_init`: values from a normal distribution
//! - `xavier_uniform`: Glorot initialization, the default for `Linear` and
//!   `Convolutional`
//!
//! # Usage Example
//! ```
//! use neurust::{nn::init::xavier_uniform, Tensor};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut weights: Tensor = Tensor::zeros(&[50, 100]);
//! xavier_uniform(&mut weights, 100, 50, &mut rng);
//! ```

use super::cast;
use crate::tensor::Tensor;
use num_traits::Float;
use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};
use rand_distr::StandardNormal;

/// Fills the tensor with values sampled uniformly from `[low, high)`.
///
/// An empty or non-finite range fills the tensor with `low` instead.
///
/// # Example
/// ```
/// # use neurust::{nn::init::uniform_init, Tensor};
/// let mut x: Tensor = Tensor::zeros(&[5]);
/// uniform_init(&mut x, -1.0, 1.0, &mut rand::thread_rng());
/// for &val in x.data() {
///     assert!(val >= -1.0 && val < 1.0);
/// }
/// ```
pub fn uniform_init<T, R>(tensor: &mut Tensor<T>, low: f64, high: f64, rng: &mut R)
where
    T: Float,
    R: Rng + ?Sized,
{
    if !(high > low) || !(high - low).is_finite() {
        tensor.fill(cast(low));
        return;
    }
    let uniform = Uniform::new(low, high);
    tensor
        .data_mut()
        .iter_mut()
        .for_each(|x| *x = cast(uniform.sample(rng)));
}

/// Fills the tensor with values sampled from `N(mean, stddev^2)`.
pub fn normal_init<T, R>(tensor: &mut Tensor<T>, mean: f64, stddev: f64, rng: &mut R)
where
    T: Float,
    R: Rng + ?Sized,
{
    tensor.data_mut().iter_mut().for_each(|x| {
        let z: f64 = StandardNormal.sample(rng);
        *x = cast(mean + stddev * z);
    });
}

/// Xavier (Glorot) uniform initialization.
///
/// The weights are sampled from `[-bound, bound]` where:
/// ```text
/// bound = sqrt(6 / (fan_in + fan_out))
/// ```
pub fn xavier_uniform<T, R>(tensor: &mut Tensor<T>, fan_in: usize, fan_out: usize, rng: &mut R)
where
    T: Float,
    R: Rng + ?Sized,
{
    let bound = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
    uniform_init(tensor, -bound, bound, rng);
}
