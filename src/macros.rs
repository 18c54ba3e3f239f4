//! Macros for writing tensor literals.

/// Creates an `f32` tensor from a nested list literal, inferring its shape.
///
/// Rows of a 2-D or 3-D literal must all have the same length.
///
/// # Examples
/// ```
/// use neurust::tensor;
///
/// let t = tensor!([1.0, 2.0, 3.0]);
/// assert_eq!(t.shape(), &[3]);
///
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape(), &[2, 2]);
///
/// // A 2x2 image with a single channel, in [height, width, channels] layout.
/// let t = tensor!([[[1.0], [3.0]], [[4.0], [2.0]]]);
/// assert_eq!(t.shape(), &[2, 2, 1]);
/// ```
#[macro_export]
macro_rules! tensor {
    // 3D case
    ([$([$([$($x:expr),+ $(,)?]),+ $(,)?]),+ $(,)?]) => {
        {
            let data: Vec<Vec<Vec<f32>>> = vec![$(vec![$(vec![$($x as f32),+]),+]),+];
            let dims = [data.len(), data[0].len(), data[0][0].len()];
            let flat: Vec<f32> = data.into_iter().flatten().flatten().collect();
            $crate::Tensor::new(flat, &dims).expect("tensor! literal must be rectangular")
        }
    };

    // 2D case
    ([$([$($x:expr),+ $(,)?]),+ $(,)?]) => {
        {
            let data: Vec<Vec<f32>> = vec![$(vec![$($x as f32),+]),+];
            let dims = [data.len(), data[0].len()];
            let flat: Vec<f32> = data.into_iter().flatten().collect();
            $crate::Tensor::new(flat, &dims).expect("tensor! literal must be rectangular")
        }
    };

    // 1D case
    ([$($x:expr),+ $(,)?]) => {
        $crate::Tensor::from(vec![$($x as f32),+])
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_tensor_macro_1d() {
        let t = tensor!([1.0, 2.0, 3.0]);
        assert_eq!(t.shape(), &[3]);
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_tensor_macro_2d() {
        let t = tensor!([
            [1.0, 2.0],
            [3.0, 4.0]
        ]);
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_tensor_macro_3d() {
        let t = tensor!([
            [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            [[7.0, 8.0], [9.0, 10.0], [11.0, 12.0]]
        ]);
        assert_eq!(t.shape(), &[2, 3, 2]);
        assert_eq!(t.get(&[1, 2, 0]).unwrap(), 11.0);
    }
}
