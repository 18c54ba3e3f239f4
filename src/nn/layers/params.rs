//! Weights, bias and their gradient accumulators.
//!
//! The affine algebra here works on a batch of `P` rows of width `width`:
//!
//! - forward: `out[P, units] = rows · weightsᵗ + bias`
//! - backward: `weight_gradient += gradᵗ · rows`, `bias_gradient += Σ grad`,
//!   `row_gradient[P, width] = grad · weights`
//!
//! `Linear` is the one-row case; `Convolutional` feeds one row per output
//! position.

use crate::{
    error::{NeurustError, Result},
    linalg::{gemm, gemm_nt, gemm_tn_acc},
    nn::{check_len, init::xavier_uniform},
    tensor::Tensor,
};
use num_traits::Float;
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet<T: Float = f32> {
    /// Shape `[units, width]`.
    weights: Tensor<T>,
    /// Shape `[units]`.
    bias: Tensor<T>,
    weight_gradient: Tensor<T>,
    bias_gradient: Tensor<T>,
}

impl<T: Float> ParameterSet<T> {
    /// Xavier-uniform weights and zero bias.
    pub fn xavier<R>(units: usize, width: usize, fan_in: usize, fan_out: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut weights = Tensor::zeros(&[units, width]);
        xavier_uniform(&mut weights, fan_in, fan_out, rng);
        Self {
            weights,
            bias: Tensor::zeros(&[units]),
            weight_gradient: Tensor::zeros(&[units, width]),
            bias_gradient: Tensor::zeros(&[units]),
        }
    }

    /// Wraps explicit weights `[units, width]` and bias `[units]`.
    pub fn from_parameters(weights: Tensor<T>, bias: Tensor<T>) -> Result<Self> {
        let (units, width) = match *weights.shape() {
            [units, width] => (units, width),
            _ => {
                return Err(NeurustError::invalid_shape(format!(
                    "weights must be a matrix, got shape {:?}",
                    weights.shape()
                )))
            }
        };
        if bias.len() != units {
            return Err(NeurustError::shape_mismatch(vec![units], bias.shape().to_vec()));
        }

        let bias = bias.reshaped(&[units])?;
        Ok(Self {
            weight_gradient: Tensor::zeros(&[units, width]),
            bias_gradient: Tensor::zeros(&[units]),
            weights,
            bias,
        })
    }

    /// Number of output units (or kernels).
    pub fn units(&self) -> usize {
        self.bias.len()
    }

    /// Number of inputs feeding each unit.
    pub fn width(&self) -> usize {
        self.weights.shape()[1]
    }

    pub fn weights(&self) -> &Tensor<T> {
        &self.weights
    }

    pub fn bias(&self) -> &Tensor<T> {
        &self.bias
    }

    pub fn weight_gradient(&self) -> &Tensor<T> {
        &self.weight_gradient
    }

    pub fn bias_gradient(&self) -> &Tensor<T> {
        &self.bias_gradient
    }

    /// `out = rows · weightsᵗ + bias`, for `count` rows.
    pub fn forward_rows(&self, rows: &[T], count: usize, out: &mut [T]) -> Result<()> {
        let units = self.units();
        gemm_nt(rows, self.weights.data(), out, count, self.width(), units)?;
        for row in out.chunks_exact_mut(units.max(1)) {
            for (o, &b) in row.iter_mut().zip(self.bias.data()) {
                *o = *o + b;
            }
        }
        Ok(())
    }

    /// Accumulates parameter gradients for `count` rows and writes the gradient
    /// with respect to the rows into `row_gradient`.
    pub fn backward_rows(
        &mut self,
        rows: &[T],
        grad: &[T],
        count: usize,
        row_gradient: &mut [T],
    ) -> Result<()> {
        let (units, width) = (self.units(), self.width());
        gemm_tn_acc(grad, rows, self.weight_gradient.data_mut(), count, units, width)?;
        for row in grad.chunks_exact(units.max(1)) {
            for (acc, &g) in self.bias_gradient.data_mut().iter_mut().zip(row) {
                *acc = *acc + g;
            }
        }
        gemm(grad, self.weights.data(), row_gradient, count, units, width)
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    /// `[weights (row-major), bias]`.
    pub fn parameters(&self) -> Tensor<T> {
        concat(&self.weights, &self.bias)
    }

    /// `[weight_gradient (row-major), bias_gradient]`.
    pub fn gradient(&self) -> Tensor<T> {
        concat(&self.weight_gradient, &self.bias_gradient)
    }

    /// Overwrites weights and bias from a flat vector and zeroes the gradients.
    pub fn update(&mut self, parameters: &Tensor<T>) -> Result<()> {
        check_len(parameters, self.parameter_count())?;
        let (weights, bias) = parameters.data().split_at(self.weights.len());
        self.weights.assign_slice(weights)?;
        self.bias.assign_slice(bias)?;
        self.zero_gradient();
        Ok(())
    }

    pub fn zero_gradient(&mut self) {
        self.weight_gradient.fill(T::zero());
        self.bias_gradient.fill(T::zero());
    }
}

fn concat<T: Float>(a: &Tensor<T>, b: &Tensor<T>) -> Tensor<T> {
    let mut data = Vec::with_capacity(a.len() + b.len());
    data.extend_from_slice(a.data());
    data.extend_from_slice(b.data());
    Tensor::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample() -> ParameterSet {
        ParameterSet::from_parameters(
            tensor!([[1.0, 2.0, 3.0], [-1.0, 0.0, 1.0]]),
            tensor!([0.5, -0.5]),
        )
        .unwrap()
    }

    #[test]
    fn test_forward_rows() -> Result<()> {
        let params = sample();
        let rows = [1.0f32, 1.0, 1.0, 0.0, 1.0, 0.0];
        let mut out = [0.0f32; 4];
        params.forward_rows(&rows, 2, &mut out)?;
        assert_eq!(out, [6.5, -0.5, 2.5, -0.5]);
        Ok(())
    }

    #[test]
    fn test_backward_rows_accumulates() -> Result<()> {
        let mut params = sample();
        let rows = [1.0f32, 2.0, 3.0];
        let grad = [1.0f32, 2.0];
        let mut row_grad = [0.0f32; 3];

        params.backward_rows(&rows, &grad, 1, &mut row_grad)?;
        params.backward_rows(&rows, &grad, 1, &mut row_grad)?;

        assert_eq!(row_grad, [-1.0, 2.0, 5.0]);
        assert_eq!(
            params.weight_gradient().to_vec(),
            vec![2.0, 4.0, 6.0, 4.0, 8.0, 12.0]
        );
        assert_eq!(params.bias_gradient().to_vec(), vec![2.0, 4.0]);
        Ok(())
    }

    #[test]
    fn test_update_resets_gradient() -> Result<()> {
        let mut params = sample();
        let mut row_grad = [0.0f32; 3];
        params.backward_rows(&[1.0, 1.0, 1.0], &[1.0, 1.0], 1, &mut row_grad)?;

        let replacement = Tensor::from(vec![0.0f32; 8]);
        params.update(&replacement)?;
        assert_eq!(params.parameters(), replacement);
        assert!(params.gradient().data().iter().all(|&g| g == 0.0));
        assert!(params.update(&Tensor::from(vec![0.0f32; 7])).is_err());
        Ok(())
    }

    #[test]
    fn test_from_parameters_checks_shapes() {
        assert!(ParameterSet::from_parameters(tensor!([1.0, 2.0]), tensor!([0.0])).is_err());
        assert!(
            ParameterSet::from_parameters(tensor!([[1.0, 2.0]]), tensor!([0.0, 1.0])).is_err()
        );
    }

    #[test]
    fn test_xavier_shapes() {
        let mut rng = StdRng::seed_from_u64(3);
        let params: ParameterSet = ParameterSet::xavier(4, 6, 6, 4, &mut rng);
        assert_eq!(params.weights().shape(), &[4, 6]);
        assert_eq!(params.parameter_count(), 28);
        assert!(params.bias().data().iter().all(|&b| b == 0.0));
    }
}
