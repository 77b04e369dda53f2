//! Row-wise helpers shared by the fitting code.
use faer::{Mat, MatRef};
use faer_traits::RealField;
use num::Float;

pub trait RowWise<T: RealField> {
    /// Multiplies row i by `scale[i]`.
    fn scale_rows(&self, scale: &[T]) -> Mat<T>;

    /// Euclidean norm of each row.
    fn row_norms(&self) -> Vec<T>;
}

impl<T: RealField + Float> RowWise<T> for MatRef<'_, T> {
    fn scale_rows(&self, scale: &[T]) -> Mat<T> {
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| self[(i, j)] * scale[i])
    }

    fn row_norms(&self) -> Vec<T> {
        (0..self.nrows())
            .map(|i| {
                (0..self.ncols())
                    .fold(T::zero(), |acc, j| acc + self[(i, j)] * self[(i, j)])
                    .sqrt()
            })
            .collect()
    }
}

/// Sum of squares.
pub fn sum_sq<T: Float>(v: &[T]) -> T {
    v.iter().fold(T::zero(), |acc, x| acc + *x * *x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_helpers() {
        let m = Mat::from_fn(2, 2, |i, j| (1 + i * 2 + j) as f64);
        let scaled = m.as_ref().scale_rows(&[2.0, -1.0]);
        assert_eq!(scaled[(0, 1)], 4.0);
        assert_eq!(scaled[(1, 0)], -3.0);

        let norms = m.as_ref().row_norms();
        assert!((norms[1] - 5.0).abs() < 1e-12);
        assert_eq!(sum_sq(&[3.0, 4.0]), 25.0);
    }
}
