//! Finite-difference checks of every differentiable layer.
//!
//! The loss is `L = Σ output[i] * weights[i]` for a fixed `weights` vector, so
//! `backward(input, weights)` must return `∂L/∂input`.

use approx::assert_relative_eq;
use neurust::{
    nn::{
        ConvGeometry, Convolutional, Layer, Linear, Logistic, Normaliser, NormaliserConfig,
        Pooling, RectifiedLinear, Sequential, Tanh, Trainable,
    },
    Result, Tensor,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const EPS: f64 = 1e-6;

fn random(len: usize, seed: u64) -> Tensor<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::from((0..len).map(|_| rng.gen_range(-1.0..1.0)).collect::<Vec<f64>>())
}

fn loss(output: &Tensor<f64>, weights: &Tensor<f64>) -> f64 {
    output.data().iter().zip(weights.data()).map(|(o, w)| o * w).sum()
}

fn numeric_input_gradient<L: Layer<f64>>(
    layer: &mut L,
    input: &Tensor<f64>,
    weights: &Tensor<f64>,
) -> Result<Vec<f64>> {
    let mut grad = vec![0.0; input.len()];
    for (i, g) in grad.iter_mut().enumerate() {
        let mut plus = input.clone();
        plus[i] += EPS;
        let mut minus = input.clone();
        minus[i] -= EPS;
        let up = loss(layer.compute(&plus)?, weights);
        let down = loss(layer.compute(&minus)?, weights);
        *g = (up - down) / (2.0 * EPS);
    }
    Ok(grad)
}

fn numeric_parameter_gradient<L: Layer<f64>>(
    layer: &mut L,
    input: &Tensor<f64>,
    weights: &Tensor<f64>,
) -> Result<Vec<f64>> {
    let base = layer.parameters();
    let mut grad = vec![0.0; base.len()];
    for (i, g) in grad.iter_mut().enumerate() {
        let mut plus = base.clone();
        plus[i] += EPS;
        layer.update_parameters(&plus)?;
        let up = loss(layer.compute(input)?, weights);

        let mut minus = base.clone();
        minus[i] -= EPS;
        layer.update_parameters(&minus)?;
        let down = loss(layer.compute(input)?, weights);

        *g = (up - down) / (2.0 * EPS);
    }
    layer.update_parameters(&base)?;
    Ok(grad)
}

fn check_input_gradient<L: Layer<f64>>(mut layer: L, input: Tensor<f64>) -> Result<()> {
    let weights = random(layer.output_size(), 99);
    let expected = numeric_input_gradient(&mut layer, &input, &weights)?;

    layer.forward(&input)?;
    let actual = layer.backward(&input, &weights)?.to_vec();
    for (a, e) in actual.iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-6);
    }
    Ok(())
}

fn check_parameter_gradient<L: Layer<f64>>(mut layer: L, input: Tensor<f64>) -> Result<()> {
    let weights = random(layer.output_size(), 98);

    layer.forward(&input)?;
    layer.backward(&input, &weights)?;
    let actual = layer.gradient().to_vec();

    let expected = numeric_parameter_gradient(&mut layer, &input, &weights)?;
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn logistic_gradient() -> Result<()> {
    check_input_gradient(Logistic::new(6), random(6, 1))
}

#[test]
fn tanh_gradient() -> Result<()> {
    check_input_gradient(Tanh::new(6), random(6, 2))
}

#[test]
fn rectified_linear_gradient() -> Result<()> {
    // keep inputs away from the kink at zero
    let input = Tensor::from(vec![-0.8, -0.3, 0.2, 0.7, 1.5]);
    check_input_gradient(RectifiedLinear::new(5), input.clone())?;
    check_input_gradient(RectifiedLinear::leaky(5, 0.05), input)
}

#[test]
fn linear_gradients() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(3);
    let layer = Linear::<f64>::with_rng(4, 3, &mut rng);
    check_input_gradient(layer.clone(), random(4, 4))?;
    check_parameter_gradient(layer, random(4, 4))
}

#[test]
fn convolution_gradients() -> Result<()> {
    let g = ConvGeometry::new(5, 4, 2, 3, 2)
        .with_padding(1, 1)
        .with_stride(2, 1);
    let mut rng = StdRng::seed_from_u64(5);
    let layer = Convolutional::<f64>::with_rng(g, 3, &mut rng)?;
    let input = random(g.input_len(), 6).reshaped(&g.input_shape())?;

    check_input_gradient(layer.clone(), input.clone())?;
    check_parameter_gradient(layer, input)
}

#[test]
fn pooling_gradient() -> Result<()> {
    let g = ConvGeometry::new(4, 4, 2, 2, 2).with_stride(1, 1);
    let input = random(g.input_len(), 7).reshaped(&g.input_shape())?;
    check_input_gradient(Pooling::<f64>::new(g)?, input)
}

#[test]
fn normaliser_gradient_without_regulariser() -> Result<()> {
    let config = NormaliserConfig::default()
        .with_factor(0.0)
        .with_learning_rate(0.5);
    let mut layer = Normaliser::<f64>::with_config(4, config)?;
    for seed in 10..20 {
        layer.forward(&random(4, seed))?;
    }
    layer.recalibrate();
    check_input_gradient(layer, random(4, 8))
}

#[test]
fn pipeline_gradient() -> Result<()> {
    let conv_geometry = ConvGeometry::new(4, 4, 1, 3, 3).with_padding(1, 1);
    let pool_geometry = ConvGeometry::new(4, 4, 2, 2, 2).with_stride(2, 2);
    let mut rng = StdRng::seed_from_u64(11);

    let model = Sequential::<f64>::new()
        .add(Convolutional::with_rng(conv_geometry, 2, &mut rng)?)
        .add(Tanh::new(32))
        .add(Pooling::new(pool_geometry)?)
        .add(Linear::with_rng(8, 3, &mut rng));
    let input = random(16, 12).reshaped(&[4, 4, 1])?;

    check_input_gradient(model, input)
}
