//! Fully connected (Linear) layer implementation.

use super::params::ParameterSet;
use crate::{
    error::Result,
    nn::{check_len, Computable, Parameterized, Trainable},
    tensor::Tensor,
};
use num_traits::Float;
use rand::Rng;

/// A fully connected (dense) layer.
///
/// This layer implements the operation:
/// `output = weights · input + bias`
///
/// with `weights` of shape `[output_size, input_size]`. Gradients of the weights
/// and bias accumulate over `backward` calls until `update_parameters`.
#[derive(Debug, Clone)]
pub struct Linear<T: Float = f32> {
    params: ParameterSet<T>,
    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Linear<T> {
    /// Creates a new linear layer with Xavier-uniform weights and zero bias,
    /// drawn from the thread RNG.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self::with_rng(input_size, output_size, &mut rand::thread_rng())
    }

    /// Like [`Linear::new`], drawing weights from `rng`.
    pub fn with_rng<R>(input_size: usize, output_size: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let params = ParameterSet::xavier(output_size, input_size, input_size, output_size, rng);
        Self::from_set(params)
    }

    /// Creates a linear layer from explicit weights `[output_size, input_size]`
    /// and bias `[output_size]`.
    pub fn from_parameters(weights: Tensor<T>, bias: Tensor<T>) -> Result<Self> {
        ParameterSet::from_parameters(weights, bias).map(Self::from_set)
    }

    fn from_set(params: ParameterSet<T>) -> Self {
        log::debug!("linear layer {} -> {}", params.width(), params.units());
        Self {
            output: Tensor::zeros(&[params.units()]),
            input_gradient: Tensor::zeros(&[params.width()]),
            params,
        }
    }

    pub fn weights(&self) -> &Tensor<T> {
        self.params.weights()
    }

    pub fn bias(&self) -> &Tensor<T> {
        self.params.bias()
    }

    pub fn weight_gradient(&self) -> &Tensor<T> {
        self.params.weight_gradient()
    }

    pub fn bias_gradient(&self) -> &Tensor<T> {
        self.params.bias_gradient()
    }
}

impl<T: Float> Computable<T> for Linear<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        check_len(input, self.params.width())?;
        self.params
            .forward_rows(input.data(), 1, self.output.data_mut())?;
        Ok(&self.output)
    }

    fn output(&self) -> &Tensor<T> {
        &self.output
    }

    fn input_size(&self) -> usize {
        self.params.width()
    }

    fn output_size(&self) -> usize {
        self.params.units()
    }
}

impl<T: Float> Trainable<T> for Linear<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        check_len(input, self.params.width())?;
        check_len(output_gradient, self.params.units())?;

        self.params.backward_rows(
            input.data(),
            output_gradient.data(),
            1,
            self.input_gradient.data_mut(),
        )?;
        self.input_gradient.reshape(input.shape())?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Linear<T> {
    fn parameter_count(&self) -> usize {
        self.params.parameter_count()
    }

    fn parameters(&self) -> Tensor<T> {
        self.params.parameters()
    }

    fn gradient(&self) -> Tensor<T> {
        self.params.gradient()
    }

    fn update_parameters(&mut self, parameters: &Tensor<T>) -> Result<()> {
        self.params.update(parameters)?;
        log::trace!("linear layer parameters replaced, gradients reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn layer() -> Linear {
        Linear::from_parameters(
            tensor!([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
            tensor!([0.1, 0.2, 0.3]),
        )
        .unwrap()
    }

    #[test]
    fn test_linear_forward() -> Result<(), Box<dyn std::error::Error>> {
        let mut linear = layer();
        let out = linear.forward(&tensor!([1.0, -1.0]))?.to_vec();
        assert_relative_eq!(out[0], -0.9, epsilon = 1e-6);
        assert_relative_eq!(out[1], -0.8, epsilon = 1e-6);
        assert_relative_eq!(out[2], -0.7, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_linear_backward() -> Result<(), Box<dyn std::error::Error>> {
        let mut linear = layer();
        let input = tensor!([1.0, -1.0]);
        linear.forward(&input)?;
        let grad = linear.backward(&input, &tensor!([1.0, 0.0, -1.0]))?.to_vec();

        // weightsᵗ · [1, 0, -1]
        assert_eq!(grad, vec![-4.0, -4.0]);
        assert_eq!(
            linear.weight_gradient().to_vec(),
            vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]
        );
        assert_eq!(linear.bias_gradient().to_vec(), vec![1.0, 0.0, -1.0]);
        Ok(())
    }

    #[test]
    fn test_linear_parameter_layout() {
        let linear = layer();
        assert_eq!(linear.parameter_count(), 9);
        assert_eq!(
            linear.parameters().to_vec(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.1, 0.2, 0.3]
        );
        assert_eq!(linear.gradient().len(), 9);
    }

    #[test]
    fn test_linear_rejects_wrong_input() {
        let mut linear = layer();
        assert!(linear.compute(&tensor!([1.0, 2.0, 3.0])).is_err());
    }

    #[test]
    fn test_random_init_is_seeded() {
        let a: Linear = Linear::with_rng(4, 3, &mut StdRng::seed_from_u64(1));
        let b: Linear = Linear::with_rng(4, 3, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.parameters(), b.parameters());
        assert_eq!(a.input_size(), 4);
        assert_eq!(a.output_size(), 3);
        assert_eq!(a.weights().shape(), &[3, 4]);
    }
}
