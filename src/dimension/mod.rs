//! Shape and stride handling for tensors.
//!
//! Every buffer in this crate is contiguous and row-major, so a dimension is fully
//! described by its shape; strides are derived from it on demand.

pub mod shape;
pub mod stride;

pub use shape::Shape;
pub use stride::Stride;
