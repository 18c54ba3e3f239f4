//! Stride handling for tensors.
//!
//! Strides are the number of elements to skip in memory to move to the next
//! element along each dimension. Only row-major layouts are produced.

use crate::error::{NeurustError, Result};
use std::ops::Index;

/// Represents the stride of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stride {
    strides: Vec<usize>,
}

impl Stride {
    /// Creates a new stride from a vector of strides.
    pub fn new(strides: Vec<usize>) -> Self {
        Self { strides }
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.strides.len()
    }

    /// Returns the stride values as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.strides
    }

    /// Computes the default row-major strides for a given shape.
    pub fn row_major(shape: &[usize]) -> Self {
        let ndim = shape.len();
        let mut strides = vec![0; ndim];

        if ndim > 0 {
            strides[ndim - 1] = 1;
            for i in (0..ndim - 1).rev() {
                strides[i] = strides[i + 1] * shape[i + 1];
            }
        }

        Self { strides }
    }

    /// Computes the flat offset of `indices`, bounds-checked against `shape`.
    pub fn offset(&self, shape: &[usize], indices: &[usize]) -> Result<usize> {
        if indices.len() != self.strides.len() || shape.len() != self.strides.len() {
            return Err(NeurustError::InvalidIndex(indices.to_vec(), shape.to_vec()));
        }

        let mut offset = 0;
        for (axis, ((&stride, &index), &dim)) in
            self.strides.iter().zip(indices).zip(shape).enumerate()
        {
            if index >= dim {
                return Err(NeurustError::IndexOutOfBounds(index, dim, axis));
            }
            offset += stride * index;
        }

        Ok(offset)
    }
}

impl Index<usize> for Stride {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.strides[index]
    }
}

impl AsRef<[usize]> for Stride {
    fn as_ref(&self) -> &[usize] {
        &self.strides
    }
}

impl From<Vec<usize>> for Stride {
    fn from(strides: Vec<usize>) -> Self {
        Self { strides }
    }
}
