//! Dropout layer implementation.
//!
//! During training every element survives with probability `keep_probability`
//! and is scaled by `1 / keep_probability`, so the expected activation equals the
//! input. Inference (`compute`) is the identity.

use crate::{
    error::{NeurustError, Result},
    nn::{activations::adopt_shape, cast, Computable, Parameterized, Trainable},
    ops::{mul_, zip_into},
    tensor::Tensor,
};
use num_traits::Float;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Inverted dropout.
///
/// A fresh mask is drawn on every `forward` and reused, unchanged, by the
/// `backward` call that follows it.
#[derive(Debug)]
pub struct Dropout<T: Float = f32> {
    /// Probability of an element being kept
    keep_probability: f64,

    /// Random seed for reproducibility
    seed: u64,

    /// Random number generator
    rng: StdRng,

    /// `1 / keep_probability` for kept elements, zero for dropped ones
    mask: Tensor<T>,

    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Dropout<T> {
    /// Creates a new Dropout layer.
    ///
    /// # Arguments
    /// * `size` - Number of input elements
    /// * `keep_probability` - Probability of an element surviving, in `(0, 1]`
    /// * `seed` - Optional random seed for reproducibility
    ///
    /// # Errors
    ///
    /// Returns `InvalidProbability` when `keep_probability` is outside `(0, 1]`.
    pub fn new(size: usize, keep_probability: f64, seed: Option<u64>) -> Result<Self> {
        if !(keep_probability > 0.0 && keep_probability <= 1.0) {
            return Err(NeurustError::InvalidProbability(keep_probability));
        }

        let seed = seed.unwrap_or_else(rand::random);
        log::debug!(
            "dropout over {} elements, keep probability {}",
            size,
            keep_probability
        );

        Ok(Self {
            keep_probability,
            seed,
            rng: StdRng::seed_from_u64(seed),
            mask: Tensor::ones(&[size]),
            output: Tensor::zeros(&[size]),
            input_gradient: Tensor::zeros(&[size]),
        })
    }

    /// Returns the keep probability.
    pub fn keep_probability(&self) -> f64 {
        self.keep_probability
    }

    /// Returns the random seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The mask drawn by the most recent `forward`.
    pub fn mask(&self) -> &Tensor<T> {
        &self.mask
    }
}

impl<T: Float> Computable<T> for Dropout<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.output])?;
        self.output.assign(input)?;
        Ok(&self.output)
    }

    fn output(&self) -> &Tensor<T> {
        &self.output
    }

    fn input_size(&self) -> usize {
        self.output.len()
    }

    fn output_size(&self) -> usize {
        self.output.len()
    }
}

impl<T: Float> Trainable<T> for Dropout<T> {
    fn forward(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(
            input,
            self.output.len(),
            &mut [&mut self.output, &mut self.mask],
        )?;

        let p = self.keep_probability;
        let scale: T = cast(1.0 / p);
        for m in self.mask.data_mut() {
            *m = if self.rng.gen::<f64>() < p {
                scale
            } else {
                T::zero()
            };
        }

        self.output.assign(input)?;
        mul_(&mut self.output, &self.mask)?;
        Ok(&self.output)
    }

    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.input_gradient])?;
        zip_into(output_gradient, &self.mask, &mut self.input_gradient, |g, m| g * m)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Dropout<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dropout_rejects_bad_probability() {
        assert!(matches!(
            Dropout::<f32>::new(3, 0.0, None),
            Err(NeurustError::InvalidProbability(_))
        ));
        assert!(Dropout::<f32>::new(3, -0.5, None).is_err());
        assert!(Dropout::<f32>::new(3, 1.5, None).is_err());
        assert!(Dropout::<f32>::new(3, 1.0, None).is_ok());
    }

    #[test]
    fn test_dropout_forward_train() -> Result<(), Box<dyn std::error::Error>> {
        let mut dropout = Dropout::new(6, 0.5, Some(42))?;
        let input = tensor!([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let output = dropout.forward(&input)?.to_vec();
        let mask = dropout.mask().to_vec();

        for ((&o, &x), &m) in output.iter().zip(input.data()).zip(&mask) {
            // dropped, or kept and scaled by 1/0.5
            assert!(m == 0.0 || m == 2.0);
            assert_relative_eq!(o, x * m);
        }
        Ok(())
    }

    #[test]
    fn test_dropout_backward_reuses_mask() -> Result<(), Box<dyn std::error::Error>> {
        let mut dropout = Dropout::new(6, 0.5, Some(42))?;
        let input = tensor!([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        dropout.forward(&input)?;
        let mask = dropout.mask().to_vec();

        let grad = dropout.backward(&input, &Tensor::ones(&[6]))?;
        assert_eq!(grad.to_vec(), mask);
        Ok(())
    }

    #[test]
    fn test_dropout_same_seed_same_mask() -> Result<(), Box<dyn std::error::Error>> {
        let input = tensor!([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mut a = Dropout::new(8, 0.3, Some(9))?;
        let mut b = Dropout::new(8, 0.3, Some(9))?;
        assert_eq!(a.forward(&input)?, b.forward(&input)?);
        assert_eq!(a.seed(), 9);
        Ok(())
    }

    #[test]
    fn test_dropout_compute_is_identity() -> Result<(), Box<dyn std::error::Error>> {
        let mut dropout = Dropout::new(3, 0.3, Some(7))?;
        let input = tensor!([1.0, -2.0, 3.0]);
        assert_eq!(dropout.compute(&input)?, &input);
        Ok(())
    }
}
