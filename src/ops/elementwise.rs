//! Element-wise operations for tensors.

use crate::{
    error::{NeurustError, Result},
    tensor::Tensor,
};
use num_traits::Float;

fn check_same_len<T: Float>(lhs: &Tensor<T>, rhs: &Tensor<T>) -> Result<()> {
    if lhs.len() != rhs.len() {
        return Err(NeurustError::shape_mismatch(
            lhs.shape().to_vec(),
            rhs.shape().to_vec(),
        ));
    }
    Ok(())
}

/// Apply a function element-wise to a tensor, in place.
pub fn map_<T, F>(tensor: &mut Tensor<T>, f: F)
where
    T: Float,
    F: Fn(T) -> T,
{
    tensor.data_mut().iter_mut().for_each(|x| *x = f(*x));
}

/// Overwrite `out` with `f` applied to each element of `input`.
pub fn map_into<T, F>(input: &Tensor<T>, out: &mut Tensor<T>, f: F) -> Result<()>
where
    T: Float,
    F: Fn(T) -> T,
{
    check_same_len(input, out)?;
    out.data_mut()
        .iter_mut()
        .zip(input.data())
        .for_each(|(o, &x)| *o = f(x));
    Ok(())
}

/// Combine `rhs` into `lhs` element-wise: `lhs[i] = f(lhs[i], rhs[i])`.
pub fn zip_with_<T, F>(lhs: &mut Tensor<T>, rhs: &Tensor<T>, f: F) -> Result<()>
where
    T: Float,
    F: Fn(T, T) -> T,
{
    check_same_len(lhs, rhs)?;
    lhs.data_mut()
        .iter_mut()
        .zip(rhs.data())
        .for_each(|(a, &b)| *a = f(*a, b));
    Ok(())
}

/// Overwrite `out` with `f(a[i], b[i])`.
pub fn zip_into<T, F>(a: &Tensor<T>, b: &Tensor<T>, out: &mut Tensor<T>, f: F) -> Result<()>
where
    T: Float,
    F: Fn(T, T) -> T,
{
    check_same_len(a, b)?;
    check_same_len(a, out)?;
    out.data_mut()
        .iter_mut()
        .zip(a.data().iter().zip(b.data()))
        .for_each(|(o, (&x, &y))| *o = f(x, y));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map() {
        let mut a = Tensor::from(vec![1.0f32, 2.0, 3.0]);
        map_(&mut a, |x| x * 2.0);
        assert_eq!(a.to_vec(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_zip_with() {
        let mut a = Tensor::from(vec![1.0f32, 2.0, 3.0]);
        let b = Tensor::from(vec![4.0, 5.0, 6.0]);
        zip_with_(&mut a, &b, |x, y| x + y).unwrap();
        assert_eq!(a.to_vec(), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_zip_into_rejects_length_mismatch() {
        let a = Tensor::from(vec![1.0f32, 2.0, 3.0]);
        let b = Tensor::from(vec![1.0f32, 2.0]);
        let mut out = Tensor::zeros(&[3]);
        assert!(zip_into(&a, &b, &mut out, |x, y| x * y).is_err());
    }
}
