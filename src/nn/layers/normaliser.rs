//! Running-statistics normaliser.
//!
//! Standardises each input element with a per-element mean and standard
//! deviation. Two sets of statistics are kept: the applied ones, used by
//! `compute`, and exponentially decayed accumulators updated by every
//! `forward`. The applied statistics only move when `update_parameters` is
//! called, so forward and backward passes between updates see stable values.

use crate::{
    error::{NeurustError, Result},
    nn::{activations::adopt_shape, cast, check_len, Computable, Parameterized, Trainable},
    tensor::Tensor,
};
use num_traits::Float;

/// Configuration for [`Normaliser`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormaliserConfig {
    /// Decay rate of the accumulators; `0` disables accumulation.
    pub learning_rate: f64,
    /// Weight of the pull towards zero mean and unit variance in `backward`.
    pub factor: f64,
    /// Lower bound for a recalibrated standard deviation.
    pub min_deviation: f64,
}

impl Default for NormaliserConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            factor: 0.001,
            min_deviation: 1e-6,
        }
    }
}

impl NormaliserConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_min_deviation(mut self, min_deviation: f64) -> Self {
        self.min_deviation = min_deviation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(NeurustError::invalid_config(format!(
                "learning rate {} outside [0, 1]",
                self.learning_rate
            )));
        }
        if !(self.factor >= 0.0) {
            return Err(NeurustError::invalid_config(format!(
                "normaliser factor {} must be non-negative",
                self.factor
            )));
        }
        if !(self.min_deviation > 0.0) {
            return Err(NeurustError::invalid_config(format!(
                "minimum deviation {} must be positive",
                self.min_deviation
            )));
        }
        Ok(())
    }
}

/// Normalises input with running mean and standard deviation.
///
/// Formula: `output = (input - mean) / sd`
#[derive(Debug, Clone)]
pub struct Normaliser<T: Float = f32> {
    config: NormaliserConfig,
    mean: Tensor<T>,
    deviation: Tensor<T>,
    acc_mean: Tensor<T>,
    acc_sum_sq: Tensor<T>,
    output: Tensor<T>,
    input_gradient: Tensor<T>,
}

impl<T: Float> Normaliser<T> {
    /// A normaliser over `size` elements with the default configuration.
    ///
    /// Starts as the identity: mean 0 and deviation 1.
    pub fn new(size: usize) -> Self {
        Self::build(size, NormaliserConfig::default())
    }

    pub fn with_config(size: usize, config: NormaliserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(size, config))
    }

    fn build(size: usize, config: NormaliserConfig) -> Self {
        log::debug!("normaliser over {} elements, {:?}", size, config);
        Self {
            config,
            mean: Tensor::zeros(&[size]),
            deviation: Tensor::ones(&[size]),
            acc_mean: Tensor::zeros(&[size]),
            acc_sum_sq: Tensor::ones(&[size]),
            output: Tensor::zeros(&[size]),
            input_gradient: Tensor::zeros(&[size]),
        }
    }

    pub fn config(&self) -> &NormaliserConfig {
        &self.config
    }

    /// The applied mean.
    pub fn mean(&self) -> &Tensor<T> {
        &self.mean
    }

    /// The applied standard deviation.
    pub fn deviation(&self) -> &Tensor<T> {
        &self.deviation
    }

    /// Moves the applied statistics to the accumulated ones:
    /// `mean = acc_mean`, `sd = sqrt(acc_sum_sq - mean²)`, floored at
    /// `min_deviation`.
    pub fn recalibrate(&mut self) {
        let floor: T = cast(self.config.min_deviation);
        let mut floored = 0;

        self.mean.data_mut().copy_from_slice(self.acc_mean.data());
        let stats = self.mean.data().iter().zip(self.acc_sum_sq.data());
        for (sd, (&m, &sq)) in self.deviation.data_mut().iter_mut().zip(stats) {
            let variance = (sq - m * m).max(T::zero());
            *sd = variance.sqrt();
            if !(*sd >= floor) {
                *sd = floor;
                floored += 1;
            }
        }

        if floored > 0 {
            log::warn!(
                "{} of {} deviations floored at {}",
                floored,
                self.deviation.len(),
                self.config.min_deviation
            );
        }
    }
}

impl<T: Float> Computable<T> for Normaliser<T> {
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.mean.len(), &mut [&mut self.output])?;
        let stats = self.mean.data().iter().zip(self.deviation.data());
        let outputs = self.output.data_mut().iter_mut().zip(input.data());
        for ((out, &x), (&m, &sd)) in outputs.zip(stats) {
            *out = (x - m) / sd;
        }
        Ok(&self.output)
    }

    fn output(&self) -> &Tensor<T> {
        &self.output
    }

    fn input_size(&self) -> usize {
        self.mean.len()
    }

    fn output_size(&self) -> usize {
        self.mean.len()
    }
}

impl<T: Float> Trainable<T> for Normaliser<T> {
    fn forward(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        check_len(input, self.mean.len())?;

        let lr: T = cast(self.config.learning_rate);
        let keep = T::one() - lr;
        let accumulators = self.acc_mean.data_mut().iter_mut().zip(self.acc_sum_sq.data_mut());
        for ((mean, sum_sq), &x) in accumulators.zip(input.data()) {
            *mean = *mean * keep + x * lr;
            *sum_sq = *sum_sq * keep + x * x * lr;
        }

        self.compute(input)
    }

    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        adopt_shape(input, self.mean.len(), &mut [&mut self.input_gradient])?;
        check_len(output_gradient, self.mean.len())?;

        let factor: T = cast(self.config.factor);
        let one = T::one();
        let stats = self.mean.data().iter().zip(self.deviation.data());
        let inputs = input.data().iter().zip(output_gradient.data());
        let grads = self.input_gradient.data_mut().iter_mut().zip(inputs);
        for ((grad, (&x, &g)), (&m, &sd)) in grads.zip(stats) {
            *grad = g / sd + factor * (x - m) + factor * x * (sd - one);
        }
        Ok(&self.input_gradient)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        &self.input_gradient
    }
}

impl<T: Float> Parameterized<T> for Normaliser<T> {
    /// Takes no external parameters; recalibrates the applied statistics from
    /// the accumulators.
    fn update_parameters(&mut self, parameters: &Tensor<T>) -> Result<()> {
        check_len(parameters, 0)?;
        self.recalibrate();
        log::trace!("normaliser statistics recalibrated");
        Ok(())
    }
}
