use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeurustError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    #[error("Invalid index: {0:?} for shape {1:?}")]
    InvalidIndex(Vec<usize>, Vec<usize>),
    #[error("Index out of bounds: {0} for dimension of size {1} at axis {2}")]
    IndexOutOfBounds(usize, usize, usize),
    #[error("Invalid slice: {0:?} for dimension of size {1}")]
    InvalidSlice(crate::view::SliceRange, usize),
    #[error("Reshape error: cannot reshape tensor of size {0:?} to {1:?}")]
    ReshapeError(Vec<usize>, Vec<usize>),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid probability: {0} (must be in (0, 1])")]
    InvalidProbability(f64),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl NeurustError {
    pub fn shape_mismatch(expected: Vec<usize>, actual: Vec<usize>) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Size-only mismatch, reported as two one-element shapes.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::shape_mismatch(vec![expected], vec![actual])
    }

    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}

pub type Result<T, E = NeurustError> = std::result::Result<T, E>;
