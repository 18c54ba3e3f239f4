//! Activation layers.
//!
//! Elementwise transforms without parameters. Every layer is built for a fixed
//! number of elements and adopts the shape of whatever input it last saw, so a
//! `[height, width, channels]` feature map passes through unchanged in layout.

use super::{check_len, Computable, Parameterized, Trainable};
use crate::{
    error::Result,
    ops::{
        map_into, sigmoid_grad_into, sigmoid_into, softmax_into, tanh_grad_into, tanh_into,
        zip_into,
    },
    tensor::Tensor,
};
use num_traits::Float;

/// Checks the input length and gives `buffers` the input's shape.
pub(crate) fn adopt_shape<T: Float>(
    input: &Tensor<T>,
    size: usize,
    buffers: &mut [&mut Tensor<T>],
) -> Result<()> {
    check_len(input, size)?;
    for buffer in buffers.iter_mut() {
        buffer.reshape(input.shape())?;
    }
    Ok(())
}

/// Logistic (sigmoid) activation.
///
/// Formula: `f(x) = 1 / (1 + exp(-x))`
#[derive(Debug, Clone)]
pub struct Logistic<T: Float = f32> {
    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Logistic<T> {
    pub fn new(size: usize) -> Self {
        Self {
            output: Tensor::zeros(&[size]),
            input_gradient: Tensor::zeros(&[size]),
        }
    }
}

impl<T: Float> Computable<T> for Logistic<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.output])?;
        sigmoid_into(input, &mut self.output)?;
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

impl<T: Float> Trainable<T> for Logistic<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.input_gradient])?;
        sigmoid_grad_into(&self.output, output_gradient, &mut self.input_gradient)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Logistic<T> {}

/// Rectified linear unit, optionally leaky.
///
/// Formula: `f(x) = x if x > 0 else negval * x`
///
/// The slope mask (`1` or `negval` per element) is recorded by every `compute`
/// and `forward` call and reused by `backward`.
#[derive(Debug, Clone)]
pub struct RectifiedLinear<T: Float = f32> {
    negval: T,
    mask: Tensor<T>,
    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> RectifiedLinear<T> {
    /// A hard threshold at zero.
    pub fn new(size: usize) -> Self {
        Self::leaky(size, T::zero())
    }

    /// Negative inputs are scaled by `negval` instead of dropped.
    pub fn leaky(size: usize, negval: T) -> Self {
        Self {
            negval,
            mask: Tensor::zeros(&[size]),
            output: Tensor::zeros(&[size]),
            input_gradient: Tensor::zeros(&[size]),
        }
    }

    pub fn negval(&self) -> T {
        self.negval
    }
}

impl<T: Float> Computable<T> for RectifiedLinear<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        let size = self.output.len();
        adopt_shape(input, size, &mut [&mut self.output, &mut self.mask])?;

        let (one, negval) = (T::one(), self.negval);
        map_into(input, &mut self.mask, |x| if x > T::zero() { one } else { negval })?;
        zip_into(input, &self.mask, &mut self.output, |x, m| x * m)?;
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

impl<T: Float> Trainable<T> for RectifiedLinear<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.input_gradient])?;
        zip_into(output_gradient, &self.mask, &mut self.input_gradient, |g, m| g * m)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for RectifiedLinear<T> {}

/// Hyperbolic tangent activation.
#[derive(Debug, Clone)]
pub struct Tanh<T: Float = f32> {
    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Tanh<T> {
    pub fn new(size: usize) -> Self {
        Self {
            output: Tensor::zeros(&[size]),
            input_gradient: Tensor::zeros(&[size]),
        }
    }
}

impl<T: Float> Computable<T> for Tanh<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.output])?;
        tanh_into(input, &mut self.output)?;
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

impl<T: Float> Trainable<T> for Tanh<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.input_gradient])?;
        tanh_grad_into(&self.output, output_gradient, &mut self.input_gradient)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Tanh<T> {}

/// Softmax over all input elements.
///
/// `backward` passes the output gradient through unchanged; the Jacobian is
/// expected to be folded into a cross-entropy loss computed by the caller.
#[derive(Debug, Clone)]
pub struct Softmax<T: Float = f32> {
    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Softmax<T> {
    pub fn new(size: usize) -> Self {
        Self {
            output: Tensor::zeros(&[size]),
            input_gradient: Tensor::zeros(&[size]),
        }
    }
}

impl<T: Float> Computable<T> for Softmax<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.output])?;
        softmax_into(input, &mut self.output)?;
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

impl<T: Float> Trainable<T> for Softmax<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.output.len(), &mut [&mut self.input_gradient])?;
        self.input_gradient.assign(output_gradient)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Softmax<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_logistic() -> Result<(), Box<dyn std::error::Error>> {
        let mut layer = Logistic::new(2);
        let input = tensor!([0.0, 2.0]);
        let out = layer.forward(&input)?.to_vec();
        assert_relative_eq!(out[0], 0.5, epsilon = 1e-6);

        let grad = layer.backward(&input, &tensor!([1.0, 1.0]))?.to_vec();
        assert_relative_eq!(grad[0], 0.25, epsilon = 1e-6);
        assert_relative_eq!(grad[1], out[1] * (1.0 - out[1]), epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_relu_masks_negative_inputs() -> Result<(), Box<dyn std::error::Error>> {
        let mut layer = RectifiedLinear::new(4);
        let input = tensor!([-1.0, 0.0, 2.0, -3.0]);
        assert_eq!(layer.forward(&input)?.to_vec(), vec![0.0, 0.0, 2.0, 0.0]);

        let grad = layer.backward(&input, &tensor!([5.0, 5.0, 5.0, 5.0]))?;
        assert_eq!(grad.to_vec(), vec![0.0, 0.0, 5.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_leaky_relu() -> Result<(), Box<dyn std::error::Error>> {
        let mut layer = RectifiedLinear::leaky(2, 0.1);
        let input = tensor!([-2.0, 3.0]);
        let out = layer.compute(&input)?.to_vec();
        assert_relative_eq!(out[0], -0.2, epsilon = 1e-6);
        assert_relative_eq!(out[1], 3.0);

        let grad = layer.backward(&input, &tensor!([1.0, 1.0]))?.to_vec();
        assert_relative_eq!(grad[0], 0.1, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 1.0);
        Ok(())
    }

    #[test]
    fn test_tanh() -> Result<(), Box<dyn std::error::Error>> {
        let mut layer = Tanh::new(1);
        let input = tensor!([0.5]);
        let y = layer.forward(&input)?[0];
        assert_relative_eq!(y, 0.5f32.tanh(), epsilon = 1e-6);

        let grad = layer.backward(&input, &tensor!([2.0]))?;
        assert_relative_eq!(grad[0], 2.0 * (1.0 - y * y), epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_softmax_backward_passes_gradient_through() -> Result<(), Box<dyn std::error::Error>> {
        let mut layer = Softmax::new(3);
        let input = tensor!([1.0, 2.0, 3.0]);
        let total: f32 = layer.forward(&input)?.data().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);

        let grad = layer.backward(&input, &tensor!([0.1, -0.2, 0.3]))?;
        assert_eq!(grad.to_vec(), vec![0.1, -0.2, 0.3]);
        Ok(())
    }

    #[test]
    fn test_output_follows_input_shape() -> Result<(), Box<dyn std::error::Error>> {
        let mut layer = Tanh::new(4);
        let input = tensor!([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(layer.compute(&input)?.shape(), &[2, 2]);
        assert!(layer.compute(&tensor!([1.0, 2.0])).is_err());
        Ok(())
    }
}
