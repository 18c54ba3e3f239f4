//! Max pooling over `[height, width, channels]` maps.

use super::{conv2d::ConvGeometry, im2col::Im2col};
use crate::{
    error::Result,
    nn::{check_len, Computable, Parameterized, Trainable},
    tensor::Tensor,
};
use num_traits::Float;

/// Max pooling layer.
///
/// Each output element is the maximum of one channel over one window; the
/// position of the winner inside the window (`ky * kernel_width + kx`) is kept
/// in `output_indexes` for the next `backward`. The first of several equal
/// maxima wins. With padding, the zero border takes part in the maximum.
#[derive(Debug, Clone)]
pub struct Pooling<T: Float = f32> {
    expansion: Im2col<T>,
    /// `[output_height, output_width, channels]`.
    output: Tensor<T>,
    output_indexes: Vec<usize>,
    /// Output gradient routed to the winning slot of each window.
    row_gradient: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Pooling<T> {
    pub fn new(geometry: ConvGeometry) -> Result<Self> {
        let expansion = Im2col::new(geometry)?;
        let (oh, ow, c) = (
            geometry.output_height(),
            geometry.output_width(),
            geometry.channels,
        );
        log::debug!("max pooling {:?} -> [{}, {}, {}]", geometry.input_shape(), oh, ow, c);

        Ok(Self {
            expansion,
            output: Tensor::zeros(&[oh, ow, c]),
            output_indexes: vec![0; oh * ow * c],
            row_gradient: Tensor::zeros(&[geometry.output_positions(), geometry.window_len()]),
            input_gradient: Tensor::zeros(&geometry.input_shape()),
        })
    }

    pub fn geometry(&self) -> &ConvGeometry {
        self.expansion.geometry()
    }

    /// Winning window index per output element, from the last forward pass.
    pub fn output_indexes(&self) -> &[usize] {
        &self.output_indexes
    }
}

impl<T: Float> Computable<T> for Pooling<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        let g = *self.geometry();
        let (c, kernel) = (g.channels, g.kernel_width * g.kernel_height);
        let rows = self.expansion.expand(input)?;

        let outputs = self.output.data_mut().chunks_exact_mut(c);
        let indexes = self.output_indexes.chunks_exact_mut(c);
        let windows = rows.data().chunks_exact(g.window_len());
        for ((row, out), idx) in windows.zip(outputs).zip(indexes) {
            for channel in 0..c {
                let mut best = row[channel];
                let mut best_index = 0;
                for k in 1..kernel {
                    let value = row[k * c + channel];
                    if value > best {
                        best = value;
                        best_index = k;
                    }
                }
                out[channel] = best;
                idx[channel] = best_index;
            }
        }
        Ok(&self.output)
    }

    fn output(&self) -> &Tensor<T> {
        &self.output
    }

    fn input_size(&self) -> usize {
        self.geometry().input_len()
    }

    fn output_size(&self) -> usize {
        self.output.len()
    }
}

impl<T: Float> Trainable<T> for Pooling<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        let g = *self.geometry();
        check_len(input, g.input_len())?;
        check_len(output_gradient, self.output.len())?;
        let c = g.channels;

        self.row_gradient.fill(T::zero());
        let rows = self.row_gradient.data_mut().chunks_exact_mut(g.window_len());
        let grads = output_gradient.data().chunks_exact(c);
        for ((row, grad), idx) in rows.zip(grads).zip(self.output_indexes.chunks_exact(c)) {
            for channel in 0..c {
                row[idx[channel] * c + channel] = grad[channel];
            }
        }

        self.expansion
            .scatter(self.row_gradient.data(), &mut self.input_gradient)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Pooling<T> {}
