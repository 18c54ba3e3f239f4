//! Linear algebra kernels for tensors.
//!
//! The kernels take explicit matrix dimensions so that callers can run them
//! over any row-major buffer (a vector is a `1 x n` matrix, a spatial
//! `[h, w, c]` map is an `h*w x c` matrix) without reshaping or copying.

mod matmul;

pub use matmul::*;
