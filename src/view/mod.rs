//! Submatrix access over contiguous tensors.
//!
//! A row-major tensor of any rank can be viewed as a matrix by folding its
//! leading axes into rows and the remaining ones into columns; a spatial
//! `[height, width, channels]` buffer, for instance, is the matrix
//! `[height, width * channels]`. Padding and unpadding are then plain submatrix
//! writes and reads.

mod slice;

pub use slice::SliceRange;

use crate::{
    error::{NeurustError, Result},
    tensor::Tensor,
};
use num_traits::Float;

/// Matrix dimensions `[rows, cols]` under which a tensor is viewed.
pub type MatrixShape = [usize; 2];

fn check_view<T: Float>(tensor: &Tensor<T>, view: MatrixShape) -> Result<()> {
    if view[0] * view[1] != tensor.len() {
        return Err(NeurustError::shape_mismatch(view.to_vec(), tensor.shape().to_vec()));
    }
    Ok(())
}

/// Copies the submatrix `rows x cols` of `src` (viewed as `view`) into `dst`.
///
/// `dst` must hold exactly `rows.len() * cols.len()` elements; its shape is kept.
pub fn read_submatrix<T: Float>(
    src: &Tensor<T>,
    view: MatrixShape,
    rows: SliceRange,
    cols: SliceRange,
    dst: &mut Tensor<T>,
) -> Result<()> {
    check_view(src, view)?;
    let row_range = rows.resolve(view[0])?;
    let col_range = cols.resolve(view[1])?;
    dst.expect_len(rows.len() * cols.len())?;

    let width = cols.len();
    let src_data = src.data();
    for (r, out) in row_range.zip(dst.data_mut().chunks_exact_mut(width.max(1))) {
        let begin = r * view[1] + col_range.start;
        out.copy_from_slice(&src_data[begin..begin + width]);
    }
    Ok(())
}

/// Writes `src` into the submatrix `rows x cols` of `dst` (viewed as `view`).
pub fn write_submatrix<T: Float>(
    dst: &mut Tensor<T>,
    view: MatrixShape,
    rows: SliceRange,
    cols: SliceRange,
    src: &Tensor<T>,
) -> Result<()> {
    check_view(dst, view)?;
    let row_range = rows.resolve(view[0])?;
    let col_range = cols.resolve(view[1])?;
    src.expect_len(rows.len() * cols.len())?;

    let width = cols.len();
    let dst_data = dst.data_mut();
    for (r, values) in row_range.zip(src.data().chunks_exact(width.max(1))) {
        let begin = r * view[1] + col_range.start;
        dst_data[begin..begin + width].copy_from_slice(values);
    }
    Ok(())
}

/// Allocating form of [`read_submatrix`]; the result has shape `[rows, cols]`.
pub fn submatrix<T: Float>(
    src: &Tensor<T>,
    view: MatrixShape,
    rows: SliceRange,
    cols: SliceRange,
) -> Result<Tensor<T>> {
    let mut out = Tensor::zeros(&[rows.len(), cols.len()]);
    read_submatrix(src, view, rows, cols, &mut out)?;
    Ok(out)
}
