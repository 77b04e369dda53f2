pub mod triangular;

use faer::{ColRef, Mat, MatRef};
use ndarray::{Array2, ArrayView2};
use thiserror::Error;

pub use triangular::{back_solve, back_solve_mat, forward_solve, forward_solve_mat};

/// Errors encountered while fitting, predicting or expanding a basis.
/// Every fallible call in the crate returns one of these synchronously.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgErrors {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// Zero (or non-finite) pivot found at the given diagonal position.
    #[error("Singular matrix: zero pivot at diagonal position {0}.")]
    SingularMatrix(usize),
    #[error("Not enough degrees of freedom: {n} observations for {p} parameters.")]
    InsufficientDegreesOfFreedom { n: usize, p: usize },
    #[error("Not enough observations: got {0}, need at least 2.")]
    InsufficientObservations(usize),
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),
    #[error("Invalid basis configuration: {0}")]
    InvalidBasisConfiguration(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0}")]
    Other(String),
}

/// Thin QR factorization of an n x p matrix with n >= p.
///
/// Returns `(Q, R)` where Q is n x p with orthonormal columns and R is p x p upper
/// triangular. The sign of each row of R is flipped (together with the matching
/// column of Q) so that the diagonal of R is non-negative. This makes the factors
/// unique for full rank inputs.
pub fn thin_qr(x: MatRef<'_, f64>) -> (Mat<f64>, Mat<f64>) {
    let qr = x.qr();
    let mut q = qr.compute_thin_Q();
    let r_view = qr.thin_R();
    let k = r_view.nrows();
    let p = r_view.ncols();
    // Entries below the diagonal are not guaranteed to be zero.
    let mut r = Mat::from_fn(k, p, |i, j| if i <= j { r_view[(i, j)] } else { 0.0 });
    for i in 0..k {
        if r[(i, i)] < 0.0 {
            for j in i..p {
                r[(i, j)] = -r[(i, j)];
            }
            for row in 0..q.nrows() {
                q[(row, i)] = -q[(row, i)];
            }
        }
    }
    (q, r)
}

/// Largest absolute diagonal entry. Used to turn a relative rank tolerance into
/// an absolute pivot tolerance.
pub fn max_abs_diag(a: MatRef<'_, f64>) -> f64 {
    let k = a.nrows().min(a.ncols());
    (0..k).fold(0f64, |acc, i| acc.max(a[(i, i)].abs()))
}

/// Computes A * b for a vector b.
pub fn mat_vec(a: MatRef<'_, f64>, b: &[f64]) -> Vec<f64> {
    let ab = a * ColRef::from_slice(b);
    ab.iter().copied().collect()
}

/// Computes A^t * b for a vector b.
pub fn mat_t_vec(a: MatRef<'_, f64>, b: &[f64]) -> Vec<f64> {
    let atb = a.transpose() * ColRef::from_slice(b);
    atb.iter().copied().collect()
}

/// Sum of squares of each row.
pub fn row_squared_norms(a: MatRef<'_, f64>) -> Vec<f64> {
    (0..a.nrows()).map(|i| a.row(i).squared_norm_l2()).collect()
}

/// Prepends a column of ones.
pub fn prepend_ones(x: MatRef<'_, f64>) -> Mat<f64> {
    let ones = Mat::<f64>::ones(x.nrows(), 1);
    faer::concat![[ones, x]]
}

// Ndarray and Faer interop. These copy; none of the fitting code keeps views
// into caller memory.
pub trait IntoFaer {
    type Faer;
    fn into_faer(self) -> Self::Faer;
}

pub trait IntoNdarray {
    type Ndarray;
    fn into_ndarray(self) -> Self::Ndarray;
}

impl IntoFaer for ArrayView2<'_, f64> {
    type Faer = Mat<f64>;

    fn into_faer(self) -> Self::Faer {
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| self[[i, j]])
    }
}

impl IntoFaer for &Array2<f64> {
    type Faer = Mat<f64>;

    fn into_faer(self) -> Self::Faer {
        self.view().into_faer()
    }
}

impl IntoNdarray for MatRef<'_, f64> {
    type Ndarray = Array2<f64>;

    fn into_ndarray(self) -> Self::Ndarray {
        Array2::from_shape_fn((self.nrows(), self.ncols()), |(i, j)| self[(i, j)])
    }
}

impl IntoNdarray for &Mat<f64> {
    type Ndarray = Array2<f64>;

    fn into_ndarray(self) -> Self::Ndarray {
        self.as_ref().into_ndarray()
    }
}

/// Builds a matrix from row vectors. All rows must have the same length.
pub fn rows_to_mat(rows: &[Vec<f64>]) -> Result<Mat<f64>, LinalgErrors> {
    let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
        return Err(LinalgErrors::DimensionMismatch(format!(
            "row {} has {} entries, expected {}",
            bad,
            rows[bad].len(),
            ncols
        )));
    }
    Ok(Mat::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

/// Splits a matrix into row vectors.
pub fn mat_to_rows(m: MatRef<'_, f64>) -> Vec<Vec<f64>> {
    (0..m.nrows())
        .map(|i| (0..m.ncols()).map(|j| m[(i, j)]).collect())
        .collect()
}
