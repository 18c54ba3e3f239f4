//! Matrix multiplication kernels.
//!
//! Naive triple loops over row-major slices, ordered so the innermost loop walks
//! contiguous memory on both operands.

use crate::error::{NeurustError, Result};
use num_traits::Float;

fn check(name: &str, slice_len: usize, rows: usize, cols: usize) -> Result<()> {
    if slice_len != rows * cols {
        return Err(NeurustError::invalid_shape(format!(
            "{} holds {} elements, expected {}x{}",
            name, slice_len, rows, cols
        )));
    }
    Ok(())
}

/// `out[m, n] = lhs[m, k] · rhs[k, n]`.
pub fn gemm<T: Float>(
    lhs: &[T],
    rhs: &[T],
    out: &mut [T],
    m: usize,
    k: usize,
    n: usize,
) -> Result<()> {
    check("lhs", lhs.len(), m, k)?;
    check("rhs", rhs.len(), k, n)?;
    check("out", out.len(), m, n)?;

    out.iter_mut().for_each(|x| *x = T::zero());
    for i in 0..m {
        let out_row = &mut out[i * n..(i + 1) * n];
        for l in 0..k {
            let a = lhs[i * k + l];
            if a == T::zero() {
                continue;
            }
            for (o, &b) in out_row.iter_mut().zip(&rhs[l * n..(l + 1) * n]) {
                *o = *o + a * b;
            }
        }
    }
    Ok(())
}

/// `out[m, n] = lhs[m, k] · rhs[n, k]ᵗ`.
pub fn gemm_nt<T: Float>(
    lhs: &[T],
    rhs: &[T],
    out: &mut [T],
    m: usize,
    k: usize,
    n: usize,
) -> Result<()> {
    check("lhs", lhs.len(), m, k)?;
    check("rhs", rhs.len(), n, k)?;
    check("out", out.len(), m, n)?;

    for i in 0..m {
        let a_row = &lhs[i * k..(i + 1) * k];
        for j in 0..n {
            let b_row = &rhs[j * k..(j + 1) * k];
            out[i * n + j] = a_row
                .iter()
                .zip(b_row)
                .fold(T::zero(), |acc, (&a, &b)| acc + a * b);
        }
    }
    Ok(())
}

/// Accumulating transposed product: `out[k, n] += lhs[m, k]ᵗ · rhs[m, n]`.
///
/// With `m == 1` this is the outer-product update `out += lhs ⊗ rhs`.
pub fn gemm_tn_acc<T: Float>(
    lhs: &[T],
    rhs: &[T],
    out: &mut [T],
    m: usize,
    k: usize,
    n: usize,
) -> Result<()> {
    check("lhs", lhs.len(), m, k)?;
    check("rhs", rhs.len(), m, n)?;
    check("out", out.len(), k, n)?;

    for i in 0..m {
        let b_row = &rhs[i * n..(i + 1) * n];
        for l in 0..k {
            let a = lhs[i * k + l];
            if a == T::zero() {
                continue;
            }
            for (o, &b) in out[l * n..(l + 1) * n].iter_mut().zip(b_row) {
                *o = *o + a * b;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gemm() {
        // [2x2] · [2x2]
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let b = [5.0f32, 6.0, 7.0, 8.0];
        let mut c = [f32::NAN; 4];
        gemm(&a, &b, &mut c, 2, 2, 2).unwrap();

        assert_relative_eq!(c[0], 19.0);
        assert_relative_eq!(c[1], 22.0);
        assert_relative_eq!(c[2], 43.0);
        assert_relative_eq!(c[3], 50.0);
    }

    #[test]
    fn test_gemm_rejects_bad_dimensions() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [1.0f32, 2.0];
        let mut out = [0.0f32; 1];
        assert!(gemm(&a, &b, &mut out, 1, 3, 1).is_err());
        assert!(gemm_nt(&a, &b, &mut out, 1, 2, 1).is_err());
    }

    #[test]
    fn test_gemm_nt_multiplies_by_transpose() {
        // [2x3] · [2x3]ᵗ
        let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0f32, 0.0, -1.0, 2.0, 1.0, 0.0];
        let mut out = [0.0f32; 4];
        gemm_nt(&a, &b, &mut out, 2, 3, 2).unwrap();
        assert_eq!(out, [-2.0, 4.0, -2.0, 13.0]);
    }

    #[test]
    fn test_gemm_tn_acc_accumulates() {
        // lhs = [1, 2] as 1x2, rhs = [3, 4, 5] as 1x3 -> outer product
        let lhs = [1.0f32, 2.0];
        let rhs = [3.0f32, 4.0, 5.0];
        let mut out = [1.0f32; 6];
        gemm_tn_acc(&lhs, &rhs, &mut out, 1, 2, 3).unwrap();
        assert_eq!(out, [4.0, 5.0, 6.0, 7.0, 9.0, 11.0]);
    }
}
