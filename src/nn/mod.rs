//! Neural network building blocks.
//!
//! Every layer ("module") owns its output and input-gradient buffers, allocated
//! once at construction and overwritten on every call. The capability surface is
//! split into three traits:
//!
//! - [`Computable`]: evaluate the layer on an input.
//! - [`Trainable`]: training-mode forward pass and the matching backward pass.
//! - [`Parameterized`]: read and replace trainable parameters and their
//!   accumulated gradients.
//!
//! [`Layer`] bundles all three for boxed composition in a [`Sequential`] pipeline.
//!
//! # Call order
//!
//! `backward` must receive the same input that was passed to the immediately
//! preceding `forward` (or `compute`) on the same layer. Several layers read state
//! cached by that call (dropout mask, pooling argmax, convolution rows, the
//! autoencoder's noisy code); violating the order yields wrong gradients, not an
//! error.

mod activations;
pub mod init;
mod layers;

pub use activations::*;
pub use layers::*;

use crate::{
    error::{NeurustError, Result},
    tensor::Tensor,
};
use num_traits::Float;
use std::fmt;

/// Converts an `f64` constant into the layer's element type.
pub(crate) fn cast<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

/// Fails with `ShapeMismatch` unless `tensor` holds `expected` elements.
pub(crate) fn check_len<T: Float>(tensor: &Tensor<T>, expected: usize) -> Result<()> {
    tensor.expect_len(expected)
}

/// A layer that can be evaluated on an input.
pub trait Computable<T: Float = f32> {
    /// Computes the layer output into the owned output buffer and returns it.
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>>;

    /// The most recently computed output.
    fn output(&self) -> &Tensor<T>;

    /// Number of input elements the layer accepts.
    fn input_size(&self) -> usize;

    /// Number of output elements the layer produces.
    fn output_size(&self) -> usize;
}

/// A layer that supports training-mode evaluation and backpropagation.
pub trait Trainable<T: Float = f32>: Computable<T> {
    /// Training-mode evaluation; may cache state for the matching `backward`.
    fn forward(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        self.compute(input)
    }

    /// Given the gradient of the loss with respect to this layer's output,
    /// computes the gradient with respect to its input and accumulates any
    /// parameter gradients.
    ///
    /// # Arguments
    /// * `input` - The input of the preceding `forward`/`compute` call.
    /// * `output_gradient` - The gradient of the loss with respect to the output.
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>>;

    /// The most recently computed input gradient.
    fn input_gradient(&self) -> &Tensor<T>;
}

/// A layer with trainable parameters.
///
/// The defaults describe a layer without parameters: both views are empty and
/// `update_parameters` accepts only an empty vector.
pub trait Parameterized<T: Float = f32> {
    /// Total number of trainable scalars.
    fn parameter_count(&self) -> usize {
        0
    }

    /// A flat copy of the parameters.
    fn parameters(&self) -> Tensor<T> {
        Tensor::empty()
    }

    /// A flat copy of the accumulated gradients, laid out like `parameters`.
    fn gradient(&self) -> Tensor<T> {
        Tensor::empty()
    }

    /// Replaces the parameters and resets the accumulated gradients to zero.
    fn update_parameters(&mut self, parameters: &Tensor<T>) -> Result<()> {
        check_len(parameters, self.parameter_count())
    }
}

/// Trait for all neural network layers.
pub trait Layer<T: Float = f32>: Trainable<T> + Parameterized<T> + fmt::Debug {}

impl<T, L> Layer<T> for L
where
    T: Float,
    L: Trainable<T> + Parameterized<T> + fmt::Debug,
{
}

/// Splits a concatenated parameter vector into consecutive chunks of the given
/// sizes.
pub(crate) fn split_parameters<T: Float>(
    parameters: &Tensor<T>,
    counts: &[usize],
) -> Result<Vec<Tensor<T>>> {
    check_len(parameters, counts.iter().sum())?;

    let mut offset = 0;
    let mut chunks = Vec::with_capacity(counts.len());
    for &count in counts {
        chunks.push(Tensor::from(parameters.data()[offset..offset + count].to_vec()));
        offset += count;
    }
    Ok(chunks)
}

/// A sequential container for layers.
///
/// Each layer's output is the next layer's input; `backward` walks the layers in
/// reverse, feeding each one the input gradient of its successor.
#[derive(Debug)]
pub struct Sequential<T: Float = f32> {
    layers: Vec<Box<dyn Layer<T>>>,
    /// Returned as output and input gradient while the container is empty.
    empty: Tensor<T>,
}

impl<T: Float + 'static> Default for Sequential<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float + 'static> Sequential<T> {
    /// Create a new sequential container.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            empty: Tensor::empty(),
        }
    }

    /// Add a layer to the container.
    pub fn add<L>(mut self, layer: L) -> Self
    where
        L: Layer<T> + 'static,
    {
        self.layers.push(Box::new(layer));
        self
    }

    /// Add an already boxed layer to the container.
    pub fn push(&mut self, layer: Box<dyn Layer<T>>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer<T>>] {
        &self.layers
    }

    fn last_index(&self) -> Result<usize> {
        match self.layers.len() {
            0 => Err(NeurustError::invalid_operation("sequential container has no layers")),
            n => Ok(n - 1),
        }
    }

    fn run(&mut self, input: &Tensor<T>, training: bool) -> Result<&Tensor<T>> {
        let last = self.last_index()?;
        for i in 0..=last {
            let (done, rest) = self.layers.split_at_mut(i);
            let layer_input = match done.last() {
                Some(previous) => previous.output(),
                None => input,
            };
            if training {
                rest[0].forward(layer_input)?;
            } else {
                rest[0].compute(layer_input)?;
            }
        }
        Ok(self.layers[last].output())
    }
}

impl<T: Float + 'static> Computable<T> for Sequential<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        self.run(input, false)
    }

    fn output(&self) -> &Tensor<T> {
        self.layers.last().map_or(&self.empty, |l| l.output())
    }

    fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.output_size())
    }
}

impl<T: Float + 'static> Trainable<T> for Sequential<T> {
    fn forward(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        self.run(input, true)
    }

    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        let last = self.last_index()?;
        for i in (0..=last).rev() {
            let (before, rest) = self.layers.split_at_mut(i);
            let (current, after) = rest.split_at_mut(1);
            let layer_input = match before.last() {
                Some(previous) => previous.output(),
                None => input,
            };
            let layer_gradient = match after.first() {
                Some(next) => next.input_gradient(),
                None => output_gradient,
            };
            current[0].backward(layer_input, layer_gradient)?;
        }
        Ok(self.layers[0].input_gradient())
    }

    fn input_gradient(&self) -> &Tensor<T> {
        self.layers.first().map_or(&self.empty, |l| l.input_gradient())
    }
}

impl<T: Float + 'static> Parameterized<T> for Sequential<T> {
    fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    fn parameters(&self) -> Tensor<T> {
        let mut data = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            data.extend_from_slice(layer.parameters().data());
        }
        Tensor::from(data)
    }

    fn gradient(&self) -> Tensor<T> {
        let mut data = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            data.extend_from_slice(layer.gradient().data());
        }
        Tensor::from(data)
    }

    fn update_parameters(&mut self, parameters: &Tensor<T>) -> Result<()> {
        let counts: Vec<usize> = self.layers.iter().map(|l| l.parameter_count()).collect();
        let chunks = split_parameters(parameters, &counts)?;
        for (layer, chunk) in self.layers.iter_mut().zip(&chunks) {
            layer.update_parameters(chunk)?;
        }
        log::trace!("updated {} parameters across {} layers", parameters.len(), counts.len());
        Ok(())
    }
}
