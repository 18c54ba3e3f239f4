//! Reduction operations for tensors.

use crate::tensor::Tensor;
use num_traits::Float;

/// Compute the sum of all elements in the tensor.
pub fn sum<T: Float>(tensor: &Tensor<T>) -> T {
    tensor.data().iter().fold(T::zero(), |acc, &x| acc + x)
}

/// Compute the mean of all elements; zero for an empty tensor.
pub fn mean<T: Float>(tensor: &Tensor<T>) -> T {
    match T::from(tensor.len()) {
        Some(count) if tensor.len() > 0 => sum(tensor) / count,
        _ => T::zero(),
    }
}

/// Find the maximum value in the tensor; negative infinity for an empty tensor.
pub fn max<T: Float>(tensor: &Tensor<T>) -> T {
    tensor.data().iter().fold(T::neg_infinity(), |acc, &x| acc.max(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_mean() {
        let a = Tensor::from(vec![1.0f32, 2.0, 3.0, 4.0]);
        assert_eq!(sum(&a), 10.0);
        assert_eq!(mean(&a), 2.5);
        assert_eq!(mean(&Tensor::<f32>::empty()), 0.0);
    }

    #[test]
    fn test_max() {
        let a = Tensor::from(vec![1.0f32, 3.0, 2.0, -3.0]);
        assert_eq!(max(&a), 3.0);
        assert_eq!(max(&Tensor::<f32>::empty()), f32::NEG_INFINITY);
    }
}
