//! Mathematical functions for tensors.

use super::{
    elementwise::{map_, map_into, zip_into},
    reduction::max,
};
use crate::{error::Result, tensor::Tensor};
use num_traits::Float;

/// Element-wise sigmoid function written into `out`.
pub fn sigmoid_into<T: Float>(input: &Tensor<T>, out: &mut Tensor<T>) -> Result<()> {
    let one = T::one();
    map_into(input, out, |x| one / (one + (-x).exp()))
}

/// Gradient of the sigmoid function, expressed through its output:
/// `out = grad_output * y * (1 - y)`.
pub fn sigmoid_grad_into<T: Float>(
    output: &Tensor<T>,
    grad_output: &Tensor<T>,
    out: &mut Tensor<T>,
) -> Result<()> {
    let one = T::one();
    zip_into(output, grad_output, out, |y, g| g * y * (one - y))
}

/// Element-wise hyperbolic tangent written into `out`.
pub fn tanh_into<T: Float>(input: &Tensor<T>, out: &mut Tensor<T>) -> Result<()> {
    map_into(input, out, |x| x.tanh())
}

/// Gradient of the hyperbolic tangent, expressed through its output:
/// `out = grad_output * (1 - y^2)`.
pub fn tanh_grad_into<T: Float>(
    output: &Tensor<T>,
    grad_output: &Tensor<T>,
    out: &mut Tensor<T>,
) -> Result<()> {
    let one = T::one();
    zip_into(output, grad_output, out, |y, g| g * (one - y * y))
}

/// Softmax over all elements of `input`, written into `out`.
///
/// The maximum is subtracted before exponentiating, so the result is unchanged
/// by adding a constant to every input and never overflows for finite inputs.
pub fn softmax_into<T: Float>(input: &Tensor<T>, out: &mut Tensor<T>) -> Result<()> {
    let shift = max(input);
    map_into(input, out, |x| (x - shift).exp())?;
    let total = out.data().iter().fold(T::zero(), |acc, &x| acc + x);
    map_(out, |x| x / total);
    Ok(())
}
