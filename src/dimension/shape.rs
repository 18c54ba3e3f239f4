//! Shape handling for tensors.
//!
//! This module provides the `Shape` trait used to validate and size tensor
//! shapes, including the spatial `[height, width, channels]` shapes consumed by
//! the convolution and pooling layers.

use crate::error::{NeurustError, Result};
use std::fmt;

/// A trait for types that can represent tensor shapes.
pub trait Shape: fmt::Debug + Clone + Send + Sync + 'static {
    /// Returns the number of dimensions.
    fn ndim(&self) -> usize;

    /// Returns the shape as a slice.
    fn as_slice(&self) -> &[usize];

    /// Validates that no axis is empty.
    fn validate(&self) -> Result<()> {
        for &dim in self.as_slice() {
            if dim == 0 {
                return Err(NeurustError::invalid_shape(format!(
                    "shape {:?} has a zero-sized axis",
                    self.as_slice()
                )));
            }
        }
        Ok(())
    }

    /// Computes the total number of elements in the shape.
    fn size(&self) -> usize {
        self.as_slice().iter().product()
    }
}

impl<const N: usize> Shape for [usize; N] {
    fn ndim(&self) -> usize {
        N
    }

    fn as_slice(&self) -> &[usize] {
        self
    }
}

impl Shape for Vec<usize> {
    fn ndim(&self) -> usize {
        self.len()
    }

    fn as_slice(&self) -> &[usize] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        assert!(vec![2, 3, 4].validate().is_ok());
        assert!(vec![0, 3, 4].validate().is_err());
        assert!([5usize, 5, 1].validate().is_ok());
    }

    #[test]
    fn test_size() {
        let shape = vec![2, 3, 4];
        assert_eq!(shape.size(), 24);
        assert_eq!(shape.ndim(), 3);
        assert_eq!([6usize, 6, 1].size(), 36);
    }
}
