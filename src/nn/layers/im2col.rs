//! Row expansion (im2col) and its inverse scatter (col2im).
//!
//! Inputs are `[height, width, channels]` maps. Each output position of a
//! [`ConvGeometry`] becomes one row holding its receptive field flattened in
//! `(ky, kx, channel)` order, so row `oy * output_width + ox` of the expansion
//! starts with the top-left pixel of that window and ends with the bottom-right.
//! Because a kernel row of an HWC map is contiguous, every window is copied as
//! `kernel_height` slices of `kernel_width * channels` elements.

use super::conv2d::ConvGeometry;
use crate::{
    error::{NeurustError, Result},
    nn::check_len,
    tensor::Tensor,
    view::{read_submatrix, write_submatrix, MatrixShape, SliceRange},
};
use num_traits::Float;

fn padded_view(g: &ConvGeometry) -> MatrixShape {
    [g.padded_height(), g.padded_width() * g.channels]
}

fn interior(g: &ConvGeometry) -> (SliceRange, SliceRange) {
    (
        SliceRange::at(g.padding_y, g.height),
        SliceRange::at(g.padding_x * g.channels, g.width * g.channels),
    )
}

fn check_slice(name: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(NeurustError::invalid_shape(format!(
            "{} holds {} elements, expected {}",
            name, len, expected
        )));
    }
    Ok(())
}

/// Zero-fills `padded` and copies `input` into its interior.
pub fn pad_into<T: Float>(
    g: &ConvGeometry,
    input: &Tensor<T>,
    padded: &mut Tensor<T>,
) -> Result<()> {
    padded.fill(T::zero());
    let (rows, cols) = interior(g);
    write_submatrix(padded, padded_view(g), rows, cols, input)
}

/// Copies the interior of a padded map into `out`.
pub fn unpad_into<T: Float>(
    g: &ConvGeometry,
    padded: &Tensor<T>,
    out: &mut Tensor<T>,
) -> Result<()> {
    let (rows, cols) = interior(g);
    read_submatrix(padded, padded_view(g), rows, cols, out)
}

/// Writes one row per output position into `rows`, reading windows from an
/// already padded map.
pub fn expand_rows<T: Float>(g: &ConvGeometry, padded: &[T], rows: &mut [T]) -> Result<()> {
    let (pw, c) = (g.padded_width(), g.channels);
    let (ow, oh) = (g.output_width(), g.output_height());
    let span = g.kernel_width * c;
    let window = g.window_len();
    check_slice("padded input", padded.len(), g.padded_height() * pw * c)?;
    check_slice("rows", rows.len(), ow * oh * window)?;

    for (position, row) in rows.chunks_exact_mut(window).enumerate() {
        let (oy, ox) = (position / ow, position % ow);
        for (ky, dst) in row.chunks_exact_mut(span).enumerate() {
            let start = ((oy * g.stride_y + ky) * pw + ox * g.stride_x) * c;
            dst.copy_from_slice(&padded[start..start + span]);
        }
    }
    Ok(())
}

/// Adds every row of `row_gradients` back onto the window it was expanded
/// from. Overlapping windows accumulate; `padded` is not cleared first.
pub fn scatter_rows<T: Float>(
    g: &ConvGeometry,
    row_gradients: &[T],
    padded: &mut [T],
) -> Result<()> {
    let (pw, c) = (g.padded_width(), g.channels);
    let (ow, oh) = (g.output_width(), g.output_height());
    let span = g.kernel_width * c;
    let window = g.window_len();
    check_slice("padded gradient", padded.len(), g.padded_height() * pw * c)?;
    check_slice("row gradients", row_gradients.len(), ow * oh * window)?;

    for (position, row) in row_gradients.chunks_exact(window).enumerate() {
        let (oy, ox) = (position / ow, position % ow);
        for (ky, src) in row.chunks_exact(span).enumerate() {
            let start = ((oy * g.stride_y + ky) * pw + ox * g.stride_x) * c;
            for (acc, &v) in padded[start..start + span].iter_mut().zip(src) {
                *acc = *acc + v;
            }
        }
    }
    Ok(())
}

/// Expansion of an unpadded input into a `[positions, window_len]` tensor.
pub fn im2col<T: Float>(g: &ConvGeometry, input: &Tensor<T>) -> Result<Tensor<T>> {
    let mut expansion = Im2col::new(*g)?;
    expansion.expand(input)?;
    Ok(expansion.rows)
}

/// Scatters `[positions, window_len]` row gradients back into a
/// `[height, width, channels]` gradient.
pub fn col2im<T: Float>(g: &ConvGeometry, row_gradients: &Tensor<T>) -> Result<Tensor<T>> {
    let mut expansion = Im2col::new(*g)?;
    let mut out = Tensor::zeros(&g.input_shape());
    expansion.scatter(row_gradients.data(), &mut out)?;
    Ok(out)
}

/// Reusable buffers for expanding inputs and scattering gradients under one
/// geometry.
#[derive(Debug, Clone)]
pub struct Im2col<T: Float = f32> {
    geometry: ConvGeometry,
    /// `None` without padding; the input is expanded directly.
    padded: Option<Tensor<T>>,
    /// `[positions, window_len]`, the expansion of the last input.
    rows: Tensor<T>,
    padded_gradient: Tensor<T>,
}

impl<T: Float> Im2col<T> {
    pub fn new(geometry: ConvGeometry) -> Result<Self> {
        geometry.validate()?;
        let padded_shape = geometry.padded_shape();
        let padded = if geometry.is_padded() {
            Some(Tensor::zeros(&padded_shape))
        } else {
            None
        };

        Ok(Self {
            geometry,
            padded,
            rows: Tensor::zeros(&[geometry.output_positions(), geometry.window_len()]),
            padded_gradient: Tensor::zeros(&padded_shape),
        })
    }

    pub fn geometry(&self) -> &ConvGeometry {
        &self.geometry
    }

    /// The rows produced by the last `expand`.
    pub fn rows(&self) -> &Tensor<T> {
        &self.rows
    }

    /// Pads `input` if the geometry asks for it and expands it into rows.
    pub fn expand(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        let g = self.geometry;
        check_len(input, g.input_len())?;

        let source = match &mut self.padded {
            Some(padded) => {
                pad_into(&g, input, padded)?;
                padded.data()
            }
            None => input.data(),
        };
        expand_rows(&g, source, self.rows.data_mut())?;
        Ok(&self.rows)
    }

    /// Scatters `row_gradients` into a zeroed padded buffer and copies the
    /// unpadded interior into `input_gradient`.
    pub fn scatter(&mut self, row_gradients: &[T], input_gradient: &mut Tensor<T>) -> Result<()> {
        let g = self.geometry;
        self.padded_gradient.fill(T::zero());
        scatter_rows(&g, row_gradients, self.padded_gradient.data_mut())?;

        if g.is_padded() {
            unpad_into(&g, &self.padded_gradient, input_gradient)
        } else {
            input_gradient.assign(&self.padded_gradient)
        }
    }
}
