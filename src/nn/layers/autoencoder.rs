//! Denoising autoencoder built from an encoder and a decoder layer.

use crate::{
    error::{NeurustError, Result},
    nn::{cast, check_len, split_parameters, Computable, Layer, Parameterized, Trainable},
    ops::{add_, sub_},
    tensor::Tensor,
};
use num_traits::Float;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Configuration for [`DenoisingAutoencoder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoencoderConfig {
    /// Probability of replacing an input element with standard-normal noise.
    pub corruption_probability: f64,
    /// Optional random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            corruption_probability: 0.2,
            seed: None,
        }
    }
}

impl AutoencoderConfig {
    pub fn with_corruption_probability(mut self, probability: f64) -> Self {
        self.corruption_probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A denoising autoencoder.
///
/// `up` encodes the input and `down` reconstructs it from the code. The layer's
/// output is the code of the clean input. During training `forward` corrupts the
/// input, encodes the corrupted copy and trains `down` to map that noisy code
/// back to the clean input; `backward` adds the decoder's input gradient to the
/// caller's output gradient before backpropagating through `up`.
#[derive(Debug)]
pub struct DenoisingAutoencoder<U, D, T: Float = f32> {
    up: U,
    down: D,
    config: AutoencoderConfig,
    rng: StdRng,
    noised: Tensor<T>,
    /// Code of the corrupted input, fed to `down`.
    intermediate: Tensor<T>,
    /// `input - reconstruction`.
    error: Tensor<T>,
    gradient_sum: Tensor<T>,
}

impl<U, D, T> DenoisingAutoencoder<U, D, T>
where
    T: Float,
    U: Layer<T>,
    D: Layer<T>,
{
    /// Pairs an encoder with a decoder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProbability` for a corruption probability outside
    /// `[0, 1]` and `InvalidConfig` when the decoder does not map the code back
    /// to the input size.
    pub fn new(up: U, down: D, config: AutoencoderConfig) -> Result<Self> {
        let p = config.corruption_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(NeurustError::InvalidProbability(p));
        }
        if up.output_size() != down.input_size() || down.output_size() != up.input_size() {
            return Err(NeurustError::invalid_config(format!(
                "decoder {} -> {} does not invert encoder {} -> {}",
                down.input_size(),
                down.output_size(),
                up.input_size(),
                up.output_size()
            )));
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        log::debug!(
            "denoising autoencoder {} -> {}, corruption probability {}",
            up.input_size(),
            up.output_size(),
            p
        );

        Ok(Self {
            noised: Tensor::zeros(&[up.input_size()]),
            intermediate: Tensor::zeros(&[up.output_size()]),
            error: Tensor::zeros(&[up.input_size()]),
            gradient_sum: Tensor::zeros(&[up.output_size()]),
            rng: StdRng::seed_from_u64(seed),
            config,
            up,
            down,
        })
    }

    pub fn up(&self) -> &U {
        &self.up
    }

    pub fn down(&self) -> &D {
        &self.down
    }

    pub fn config(&self) -> &AutoencoderConfig {
        &self.config
    }

    /// The decoder's reconstruction from the last `forward`.
    pub fn reconstruction(&self) -> &Tensor<T> {
        self.down.output()
    }

    /// The corrupted input from the last `forward`.
    pub fn noised(&self) -> &Tensor<T> {
        &self.noised
    }

    fn corrupt(&mut self, input: &Tensor<T>) -> Result<()> {
        self.noised.reshape(input.shape())?;
        let p = self.config.corruption_probability;
        for (noisy, &x) in self.noised.data_mut().iter_mut().zip(input.data()) {
            *noisy = if self.rng.gen::<f64>() < p {
                cast(self.rng.sample::<f64, _>(StandardNormal))
            } else {
                x
            };
        }
        Ok(())
    }
}

impl<U, D, T> Computable<T> for DenoisingAutoencoder<U, D, T>
where
    T: Float,
    U: Layer<T>,
    D: Layer<T>,
{
    fn compute(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        self.up.compute(input)
    }

    fn output(&self) -> &Tensor<T> {
        self.up.output()
    }

    fn input_size(&self) -> usize {
        self.up.input_size()
    }

    fn output_size(&self) -> usize {
        self.up.output_size()
    }
}

impl<U, D, T> Trainable<T> for DenoisingAutoencoder<U, D, T>
where
    T: Float,
    U: Layer<T>,
    D: Layer<T>,
{
    fn forward(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>> {
        check_len(input, self.up.input_size())?;
        self.corrupt(input)?;

        let code = self.up.compute(&self.noised)?;
        self.intermediate.reshape(code.shape())?;
        self.intermediate.assign(code)?;

        self.up.forward(input)?;
        self.down.forward(&self.intermediate)?;
        Ok(self.up.output())
    }

    fn backward(&mut self, input: &Tensor<T>, output_gradient: &Tensor<T>) -> Result<&Tensor<T>> {
        check_len(input, self.up.input_size())?;
        check_len(output_gradient, self.up.output_size())?;

        self.error.reshape(input.shape())?;
        self.error.assign(input)?;
        sub_(&mut self.error, self.down.output())?;
        let decoder_gradient = self.down.backward(&self.intermediate, &self.error)?;

        self.gradient_sum.assign(output_gradient)?;
        add_(&mut self.gradient_sum, decoder_gradient)?;
        self.up.backward(input, &self.gradient_sum)
    }

    fn input_gradient(&self) -> &Tensor<T> {
        self.up.input_gradient()
    }
}

impl<U, D, T> Parameterized<T> for DenoisingAutoencoder<U, D, T>
where
    T: Float,
    U: Layer<T>,
    D: Layer<T>,
{
    fn parameter_count(&self) -> usize {
        self.up.parameter_count() + self.down.parameter_count()
    }

    fn parameters(&self) -> Tensor<T> {
        let mut data = self.up.parameters().into_vec();
        data.extend_from_slice(self.down.parameters().data());
        Tensor::from(data)
    }

    fn gradient(&self) -> Tensor<T> {
        let mut data = self.up.gradient().into_vec();
        data.extend_from_slice(self.down.gradient().data());
        Tensor::from(data)
    }

    fn update_parameters(&mut self, parameters: &Tensor<T>) -> Result<()> {
        let counts = [self.up.parameter_count(), self.down.parameter_count()];
        let chunks = split_parameters(parameters, &counts)?;
        self.up.update_parameters(&chunks[0])?;
        self.down.update_parameters(&chunks[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nn::Linear, tensor};

    fn pair() -> (Linear, Linear) {
        let up = Linear::from_parameters(
            tensor!([[1.0, 0.5, -1.0], [0.0, 2.0, 1.0]]),
            tensor!([0.1, -0.1]),
        )
        .unwrap();
        let down = Linear::from_parameters(
            tensor!([[1.0, 0.0], [0.5, 0.5], [0.0, -1.0]]),
            tensor!([0.0, 0.0, 0.2]),
        )
        .unwrap();
        (up, down)
    }

    #[test]
    fn test_rejects_mismatched_pair() {
        let up = Linear::from_parameters(tensor!([[1.0, 0.0]]), tensor!([0.0])).unwrap();
        let down = Linear::from_parameters(tensor!([[1.0], [1.0], [1.0]]), Tensor::zeros(&[3]));
        let down = down.unwrap();
        let result = DenoisingAutoencoder::<_, _, f32>::new(up, down, AutoencoderConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_probability() {
        let (up, down) = pair();
        let config = AutoencoderConfig::default().with_corruption_probability(1.5);
        assert!(matches!(
            DenoisingAutoencoder::<_, _, f32>::new(up, down, config),
            Err(NeurustError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_compute_is_encoder() -> Result<(), Box<dyn std::error::Error>> {
        let (mut up, down) = pair();
        let input = tensor!([1.0, 2.0, 3.0]);
        let expected = up.compute(&input)?.clone();

        let config = AutoencoderConfig::default().with_seed(1);
        let mut ae: DenoisingAutoencoder<Linear, Linear> =
            DenoisingAutoencoder::new(up, down, config)?;
        assert_eq!(ae.compute(&input)?, &expected);
        assert_eq!(ae.output_size(), 2);
        Ok(())
    }

    #[test]
    fn test_full_corruption_replaces_input() -> Result<(), Box<dyn std::error::Error>> {
        let (up, down) = pair();
        let config = AutoencoderConfig::default()
            .with_corruption_probability(1.0)
            .with_seed(5);
        let mut ae: DenoisingAutoencoder<Linear, Linear> =
            DenoisingAutoencoder::new(up, down, config)?;
        let input = tensor!([100.0, 100.0, 100.0]);
        ae.forward(&input)?;
        assert!(ae.noised().data().iter().all(|&x| x.abs() < 50.0));
        Ok(())
    }

    #[test]
    fn test_parameters_split_up_then_down() -> Result<(), Box<dyn std::error::Error>> {
        let (up, down) = pair();
        let (up_params, down_params) = (up.parameters(), down.parameters());
        let config = AutoencoderConfig::default();
        let mut ae: DenoisingAutoencoder<Linear, Linear> =
            DenoisingAutoencoder::new(up, down, config)?;

        assert_eq!(ae.parameter_count(), 8 + 9);
        let params = ae.parameters();
        assert_eq!(&params.data()[..8], up_params.data());
        assert_eq!(&params.data()[8..], down_params.data());

        let replacement = Tensor::from((0..17).map(|i| i as f32).collect::<Vec<_>>());
        ae.update_parameters(&replacement)?;
        assert_eq!(ae.up().parameters().to_vec(), (0..8).map(|i| i as f32).collect::<Vec<_>>());
        assert_eq!(ae.down().parameters()[0], 8.0);
        assert!(ae.gradient().data().iter().all(|&g| g == 0.0));
        Ok(())
    }
}
