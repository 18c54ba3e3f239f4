//! 2D convolutional layer implementation.
//!
//! The convolution is computed as one matrix product over the im2col expansion
//! of the input: `output[positions, kernels] = rows · weightsᵗ + bias`, with
//! `weights` of shape `[kernels, kernel_height * kernel_width * channels]`.
//! Inputs are `[height, width, channels]`, outputs
//! `[output_height, output_width, kernels]`.

use super::{im2col::Im2col, params::ParameterSet};
use crate::{
    error::{NeurustError, Result},
    nn::{check_len, Computable, Parameterized, Trainable},
    tensor::Tensor,
};
use num_traits::Float;
use rand::Rng;

/// Number of window positions along one axis:
/// `(dim + 2 * padding - kernel) / stride + 1`.
///
/// Assumes the kernel fits in the padded input and a non-zero stride, as
/// checked by [`ConvGeometry::validate`]; otherwise the result saturates to 1.
pub fn get_padded_strided_dimension(
    dim: usize,
    padding: usize,
    kernel: usize,
    stride: usize,
) -> usize {
    (dim + 2 * padding).saturating_sub(kernel) / stride.max(1) + 1
}

/// Spatial configuration shared by convolution and pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvGeometry {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub kernel_width: usize,
    pub kernel_height: usize,
    pub padding_x: usize,
    pub padding_y: usize,
    pub stride_x: usize,
    pub stride_y: usize,
}

impl Default for ConvGeometry {
    fn default() -> Self {
        Self::new(1, 1, 1, 1, 1)
    }
}

impl ConvGeometry {
    /// An unpadded geometry with unit strides.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        kernel_width: usize,
        kernel_height: usize,
    ) -> Self {
        Self {
            width,
            height,
            channels,
            kernel_width,
            kernel_height,
            padding_x: 0,
            padding_y: 0,
            stride_x: 1,
            stride_y: 1,
        }
    }

    pub fn with_padding(mut self, padding_x: usize, padding_y: usize) -> Self {
        self.padding_x = padding_x;
        self.padding_y = padding_y;
        self
    }

    pub fn with_stride(mut self, stride_x: usize, stride_y: usize) -> Self {
        self.stride_x = stride_x;
        self.stride_y = stride_y;
        self
    }

    /// Checks that every size and stride is non-zero and that the kernel fits
    /// in the padded input.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("width", self.width),
            ("height", self.height),
            ("channels", self.channels),
            ("kernel width", self.kernel_width),
            ("kernel height", self.kernel_height),
            ("horizontal stride", self.stride_x),
            ("vertical stride", self.stride_y),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(NeurustError::invalid_config(format!("{} must be non-zero", name)));
        }
        if self.kernel_width > self.padded_width() || self.kernel_height > self.padded_height() {
            return Err(NeurustError::invalid_config(format!(
                "kernel {}x{} does not fit padded input {}x{}",
                self.kernel_width,
                self.kernel_height,
                self.padded_width(),
                self.padded_height()
            )));
        }
        Ok(())
    }

    pub fn padded_width(&self) -> usize {
        self.width + 2 * self.padding_x
    }

    pub fn padded_height(&self) -> usize {
        self.height + 2 * self.padding_y
    }

    pub fn output_width(&self) -> usize {
        get_padded_strided_dimension(self.width, self.padding_x, self.kernel_width, self.stride_x)
    }

    pub fn output_height(&self) -> usize {
        get_padded_strided_dimension(self.height, self.padding_y, self.kernel_height, self.stride_y)
    }

    /// Number of windows, one per output position.
    pub fn output_positions(&self) -> usize {
        self.output_width() * self.output_height()
    }

    /// Elements in one flattened window: `kernel_height * kernel_width * channels`.
    pub fn window_len(&self) -> usize {
        self.kernel_height * self.kernel_width * self.channels
    }

    pub fn input_len(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub fn input_shape(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }

    pub fn padded_shape(&self) -> [usize; 3] {
        [self.padded_height(), self.padded_width(), self.channels]
    }

    pub fn is_padded(&self) -> bool {
        self.padding_x > 0 || self.padding_y > 0
    }
}

/// A 2D convolutional layer.
///
/// `backward` reuses the rows expanded by the preceding `forward` or `compute`
/// call; it must receive the same input.
#[derive(Debug, Clone)]
pub struct Convolutional<T: Float = f32> {
    expansion: Im2col<T>,
    params: ParameterSet<T>,
    output: Tensor<T>,
    /// Gradient with respect to the expanded rows, `[positions, window_len]`.
    row_gradient: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Convolutional<T> {
    /// Creates a convolution with `kernels` Xavier-uniform kernels and zero bias,
    /// drawn from the thread RNG.
    pub fn new(geometry: ConvGeometry, kernels: usize) -> Result<Self> {
        Self::with_rng(geometry, kernels, &mut rand::thread_rng())
    }

    /// Like [`Convolutional::new`], drawing weights from `rng`.
    pub fn with_rng<R>(geometry: ConvGeometry, kernels: usize, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        if kernels == 0 {
            return Err(NeurustError::invalid_config("kernel count must be non-zero"));
        }
        geometry.validate()?;
        let window = geometry.window_len();
        let fan_out = kernels * geometry.kernel_width * geometry.kernel_height;
        let params = ParameterSet::xavier(kernels, window, window, fan_out, rng);
        Self::from_set(geometry, params)
    }

    /// Creates a convolution from explicit weights
    /// `[kernels, kernel_height * kernel_width * channels]` and bias `[kernels]`.
    pub fn from_parameters(
        geometry: ConvGeometry,
        weights: Tensor<T>,
        bias: Tensor<T>,
    ) -> Result<Self> {
        let params = ParameterSet::from_parameters(weights, bias)?;
        if params.width() != geometry.window_len() {
            return Err(NeurustError::shape_mismatch(
                vec![params.units(), geometry.window_len()],
                params.weights().shape().to_vec(),
            ));
        }
        Self::from_set(geometry, params)
    }

    fn from_set(geometry: ConvGeometry, params: ParameterSet<T>) -> Result<Self> {
        let expansion = Im2col::new(geometry)?;
        let (oh, ow) = (geometry.output_height(), geometry.output_width());
        log::debug!(
            "convolution {:?} -> [{}, {}, {}]",
            geometry.input_shape(),
            oh,
            ow,
            params.units()
        );

        Ok(Self {
            output: Tensor::zeros(&[oh, ow, params.units()]),
            row_gradient: Tensor::zeros(&[geometry.output_positions(), geometry.window_len()]),
            input_gradient: Tensor::zeros(&geometry.input_shape()),
            expansion,
            params,
        })
    }

    pub fn geometry(&self) -> &ConvGeometry {
        self.expansion.geometry()
    }

    pub fn kernels(&self) -> usize {
        self.params.units()
    }

    pub fn weights(&self) -> &Tensor<T> {
        self.params.weights()
    }

    pub fn bias(&self) -> &Tensor<T> {
        self.params.bias()
    }
}

impl<T: Float> Computable<T> for Convolutional<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        let positions = self.geometry().output_positions();
        let rows = self.expansion.expand(input)?;
        self.params
            .forward_rows(rows.data(), positions, self.output.data_mut())?;
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

impl<T: Float> Trainable<T> for Convolutional<T> {
    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        check_len(input, self.geometry().input_len())?;
        check_len(output_gradient, self.output.len())?;
        let positions = self.geometry().output_positions();

        self.params.backward_rows(
            self.expansion.rows().data(),
            output_gradient.data(),
            positions,
            self.row_gradient.data_mut(),
        )?;
        self.expansion
            .scatter(self.row_gradient.data(), &mut self.input_gradient)?;
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Convolutional<T> {
    fn parameter_count(&self) -> usize {
        self.params.parameter_count()
    }

    fn parameters(&self) -> Tensor<T> {
        self.params.parameters()
    }

    fn gradient(&self) -> Tensor<T> {
        self.params.gradient()
    }

    fn update_parameters(&mut self, parameters: &Tensor<T>) -> Result<()> {
        self.params.update(parameters)?;
        log::trace!("convolution parameters replaced, gradients reset");
        Ok(())
    }
}
