//! Core tensor type.
//!
//! This module provides the `Tensor` type: an owned, contiguous, row-major buffer
//! together with its shape. Layers allocate their tensors once and then overwrite
//! them in place, so most operations here mutate rather than allocate.

use crate::{
    dimension::{Shape, Stride},
    error::{NeurustError, Result},
};
use num_traits::Float;
use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// A dense n-dimensional array.
///
/// # Type Parameters
///
/// * `T`: The floating point element type (`f32` unless stated otherwise).
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T = f32> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T: Float> Tensor<T> {
    /// Creates a new tensor from row-major data and a shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match the shape size.
    pub fn new(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let shape = shape.to_vec();
        if data.len() != shape.size() {
            return Err(NeurustError::shape_mismatch(shape, vec![data.len()]));
        }
        Ok(Self { data, shape })
    }

    /// Creates a tensor by copying `data`.
    pub fn from_slice(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::new(data.to_vec(), shape)
    }

    /// Creates a tensor filled with `value`.
    pub fn filled(shape: &[usize], value: T) -> Self {
        Self {
            data: vec![value; shape.iter().product()],
            shape: shape.to_vec(),
        }
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, T::zero())
    }

    /// Creates a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::filled(shape, T::one())
    }

    /// Creates a zero-length vector, used as the parameter view of layers
    /// without parameters.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            shape: vec![0],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns the row-major strides of this tensor.
    pub fn strides(&self) -> Stride {
        Stride::row_major(&self.shape)
    }

    /// Reads the element at a multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> Result<T> {
        let offset = self.strides().offset(&self.shape, indices)?;
        Ok(self.data[offset])
    }

    /// Writes the element at a multi-dimensional index.
    pub fn set(&mut self, indices: &[usize], value: T) -> Result<()> {
        let offset = self.strides().offset(&self.shape, indices)?;
        self.data[offset] = value;
        Ok(())
    }

    /// Changes the shape in place. Only metadata changes; the element count must
    /// stay the same.
    pub fn reshape(&mut self, shape: &[usize]) -> Result<()> {
        if shape.iter().product::<usize>() != self.data.len() {
            return Err(NeurustError::ReshapeError(self.shape.clone(), shape.to_vec()));
        }
        if self.shape != shape {
            self.shape = shape.to_vec();
        }
        Ok(())
    }

    /// Consumes the tensor and returns it with a new shape.
    pub fn reshaped(mut self, shape: &[usize]) -> Result<Self> {
        self.reshape(shape)?;
        Ok(self)
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Copies the contents of `other` into this tensor, keeping this tensor's shape.
    pub fn assign(&mut self, other: &Tensor<T>) -> Result<()> {
        self.assign_slice(other.data())
    }

    /// Copies `values` into this tensor.
    pub fn assign_slice(&mut self, values: &[T]) -> Result<()> {
        if values.len() != self.data.len() {
            return Err(NeurustError::length_mismatch(self.data.len(), values.len()));
        }
        self.data.copy_from_slice(values);
        Ok(())
    }

    /// Fails with `ShapeMismatch` unless this tensor holds exactly `expected` elements.
    pub fn expect_len(&self, expected: usize) -> Result<()> {
        if self.data.len() != expected {
            return Err(NeurustError::shape_mismatch(vec![expected], self.shape.clone()));
        }
        Ok(())
    }
}

impl<T: Float> From<Vec<T>> for Tensor<T> {
    fn from(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }
}

impl<T> Index<usize> for Tensor<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Tensor<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: Float + fmt::Display> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor{:?}[", self.shape)?;
        for (i, x) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, "]")
    }
}
