use crate::linalg::{max_abs_diag, thin_qr, LinalgErrors};
use faer::Mat;

/// Default relative pivot size below which the centered powers count as
/// linearly dependent.
pub const DEFAULT_POLY_RANK_TOL: f64 = 1e-10;

/// Powers x^1..x^degree (raw), or an orthonormal polynomial basis.
///
/// The orthogonal basis is the Q factor of [1, xc, xc^2, ..., xc^degree] with
/// xc = x - mean(x), less its first column. Columns have unit norm and are
/// orthogonal to a constant, so they do not compete with an intercept.
/// A diagonal entry of R at or below `rank_tol * max|r_ii|` is a rank
/// deficiency. `rank_tol` is ignored for raw powers.
pub fn poly(x: &[f64], degree: usize, raw: bool, rank_tol: f64) -> Result<Mat<f64>, LinalgErrors> {
    if !(rank_tol >= 0.0 && rank_tol.is_finite()) {
        return Err(LinalgErrors::InvalidParameter(format!(
            "rank tolerance must be finite and non-negative, got {}",
            rank_tol
        )));
    }
    if degree == 0 {
        return Err(LinalgErrors::InvalidBasisConfiguration(
            "polynomial degree must be at least 1".into(),
        ));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(LinalgErrors::InvalidBasisConfiguration(
            "polynomial basis needs finite inputs".into(),
        ));
    }
    let n = x.len();
    if raw {
        return Ok(Mat::from_fn(n, degree, |i, j| x[i].powi(j as i32 + 1)));
    }
    if n <= degree {
        return Err(LinalgErrors::InvalidBasisConfiguration(format!(
            "orthogonal polynomial of degree {} needs more than {} points, got {}",
            degree, degree, n
        )));
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let powers = Mat::from_fn(n, degree + 1, |i, j| (x[i] - mean).powi(j as i32));
    let (q, r) = thin_qr(powers.as_ref());
    let tol = rank_tol * max_abs_diag(r.as_ref());
    if let Some(j) = (0..=degree).find(|&j| r[(j, j)] <= tol) {
        return Err(LinalgErrors::InvalidBasisConfiguration(format!(
            "x has too few distinct values for degree {} (rank deficient at power {})",
            degree, j
        )));
    }
    Ok(Mat::from_fn(n, degree, |i, j| q[(i, j + 1)]))
}

/// The n-th Legendre polynomial at x, by the three term recurrence
/// P_n = ((2n - 1) x P_{n-1} - (n - 1) P_{n-2}) / n.
pub fn legendre(x: f64, n: usize) -> f64 {
    match n {
        0 => 1.0,
        1 => x,
        _ => {
            let (mut p0, mut p1) = (1.0, x);
            for k in 2..=n {
                let kf = k as f64;
                let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
                p0 = p1;
                p1 = p2;
            }
            p1
        }
    }
}

/// Columns P_1(x)..P_degree(x).
pub fn legendre_basis(x: &[f64], degree: usize) -> Result<Mat<f64>, LinalgErrors> {
    if degree == 0 {
        return Err(LinalgErrors::InvalidBasisConfiguration(
            "Legendre basis needs at least one polynomial".into(),
        ));
    }
    Ok(Mat::from_fn(x.len(), degree, |i, j| legendre(x[i], j + 1)))
}

/// cos(j pi x)
pub fn cosine(x: f64, j: usize) -> f64 {
    (j as f64 * std::f64::consts::PI * x).cos()
}

/// Columns cosine(x, 1)..cosine(x, count).
pub fn cosine_basis(x: &[f64], count: usize) -> Result<Mat<f64>, LinalgErrors> {
    if count == 0 {
        return Err(LinalgErrors::InvalidBasisConfiguration(
            "cosine basis needs at least one frequency".into(),
        ));
    }
    Ok(Mat::from_fn(x.len(), count, |i, j| cosine(x[i], j + 1)))
}
