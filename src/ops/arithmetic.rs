//! Arithmetic operations for tensors.

use super::elementwise::zip_with_;
use crate::{error::Result, tensor::Tensor};
use num_traits::Float;

/// Element-wise in-place addition: `lhs += rhs`.
pub fn add_<T: Float>(lhs: &mut Tensor<T>, rhs: &Tensor<T>) -> Result<()> {
    zip_with_(lhs, rhs, |a, b| a + b)
}

/// Element-wise in-place subtraction: `lhs -= rhs`.
pub fn sub_<T: Float>(lhs: &mut Tensor<T>, rhs: &Tensor<T>) -> Result<()> {
    zip_with_(lhs, rhs, |a, b| a - b)
}

/// Element-wise in-place multiplication: `lhs *= rhs`.
pub fn mul_<T: Float>(lhs: &mut Tensor<T>, rhs: &Tensor<T>) -> Result<()> {
    zip_with_(lhs, rhs, |a, b| a * b)
}
