//! Triangular solves by direct substitution.
//!
//! Only the relevant triangle of `a` is read; the other entries are ignored and
//! not validated. A pivot with `|a_ii| <= pivot_tol`, or a non-finite pivot, is
//! reported as [`LinalgErrors::SingularMatrix`]. Pass `0.0` to only reject exact zeros.
use super::LinalgErrors;
use faer::{Mat, MatRef};

#[inline]
fn check_system(a: MatRef<'_, f64>, rhs_rows: usize) -> Result<(), LinalgErrors> {
    if a.nrows() != a.ncols() {
        Err(LinalgErrors::DimensionMismatch(format!(
            "triangular matrix must be square, got {} x {}",
            a.nrows(),
            a.ncols()
        )))
    } else if a.nrows() != rhs_rows {
        Err(LinalgErrors::DimensionMismatch(format!(
            "matrix has {} rows but right hand side has {}",
            a.nrows(),
            rhs_rows
        )))
    } else {
        Ok(())
    }
}

#[inline]
fn check_pivots(a: MatRef<'_, f64>, pivot_tol: f64) -> Result<(), LinalgErrors> {
    match (0..a.nrows()).find(|&i| {
        let d = a[(i, i)];
        !d.is_finite() || d.abs() <= pivot_tol
    }) {
        Some(i) => Err(LinalgErrors::SingularMatrix(i)),
        None => Ok(()),
    }
}

/// Solves `A x = b` for upper triangular `A`.
pub fn back_solve(a: MatRef<'_, f64>, b: &[f64], pivot_tol: f64) -> Result<Vec<f64>, LinalgErrors> {
    check_system(a, b.len())?;
    check_pivots(a, pivot_tol)?;
    let n = b.len();
    let mut x = vec![0f64; n];
    for i in (0..n).rev() {
        let s = ((i + 1)..n).fold(b[i], |acc, j| acc - a[(i, j)] * x[j]);
        x[i] = s / a[(i, i)];
    }
    Ok(x)
}

/// Solves `A x = b` for lower triangular `A`.
pub fn forward_solve(
    a: MatRef<'_, f64>,
    b: &[f64],
    pivot_tol: f64,
) -> Result<Vec<f64>, LinalgErrors> {
    check_system(a, b.len())?;
    check_pivots(a, pivot_tol)?;
    let n = b.len();
    let mut x = vec![0f64; n];
    for i in 0..n {
        let s = (0..i).fold(b[i], |acc, j| acc - a[(i, j)] * x[j]);
        x[i] = s / a[(i, i)];
    }
    Ok(x)
}

/// Solves `A X = B` for upper triangular `A`, one column of `B` at a time.
pub fn back_solve_mat(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    pivot_tol: f64,
) -> Result<Mat<f64>, LinalgErrors> {
    check_system(a, b.nrows())?;
    check_pivots(a, pivot_tol)?;
    let n = a.nrows();
    let mut x = Mat::<f64>::zeros(n, b.ncols());
    for c in 0..b.ncols() {
        for i in (0..n).rev() {
            let s = ((i + 1)..n).fold(b[(i, c)], |acc, j| acc - a[(i, j)] * x[(j, c)]);
            x[(i, c)] = s / a[(i, i)];
        }
    }
    Ok(x)
}

/// Solves `A X = B` for lower triangular `A`, one column of `B` at a time.
pub fn forward_solve_mat(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    pivot_tol: f64,
) -> Result<Mat<f64>, LinalgErrors> {
    check_system(a, b.nrows())?;
    check_pivots(a, pivot_tol)?;
    let n = a.nrows();
    let mut x = Mat::<f64>::zeros(n, b.ncols());
    for c in 0..b.ncols() {
        for i in 0..n {
            let s = (0..i).fold(b[(i, c)], |acc, j| acc - a[(i, j)] * x[(j, c)]);
            x[(i, c)] = s / a[(i, i)];
        }
    }
    Ok(x)
}
