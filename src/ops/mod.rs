//! Mathematical operations for tensors.
//!
//! All operations write into an existing tensor rather than allocating a new
//! one: trailing-underscore functions mutate their first argument, `*_into`
//! functions overwrite an explicit output buffer. Operands must hold the same
//! number of elements; shapes are otherwise not compared, so a `[h, w, c]`
//! buffer and its flattened `[h * w * c]` gradient combine freely.

mod arithmetic;
mod elementwise;
mod math;
mod reduction;

pub use arithmetic::*;
pub use elementwise::*;
pub use math::*;
pub use reduction::*;
