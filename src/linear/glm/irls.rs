#![allow(non_snake_case)]
use super::family::Family;
use crate::linalg::{back_solve, mat_t_vec, mat_vec, max_abs_diag, thin_qr, LinalgErrors};
use crate::linear::utils::RowWise;
use faer::{Mat, MatRef};
use itertools::izip;
use serde::{Deserialize, Serialize};

/// Parameters for the IRLS algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrlsParams {
    pub max_iter: usize,
    /// Stop once the largest coefficient change is below this.
    pub tol: f64,
    /// Relative pivot tolerance for each weighted least squares solve.
    pub rank_tol: f64,
}

impl Default for IrlsParams {
    fn default() -> Self {
        IrlsParams {
            max_iter: 50,
            tol: 1e-8,
            rank_tol: 1e-12,
        }
    }
}

impl IrlsParams {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        IrlsParams {
            max_iter,
            tol,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrlsStatus {
    Converged,
    /// The iteration cap was hit. The last iterate is still returned.
    MaxIterationsReached,
}

/// Output of [`irls`]. `q` and `r` come from the final weighted design
/// sqrt(w) X, so `(R^t R)^-1` is the inverse Fisher information.
#[derive(Debug, Clone)]
pub struct IrlsFit {
    pub coefficients: Vec<f64>,
    pub q: Mat<f64>,
    pub r: Mat<f64>,
    pub iterations: usize,
    pub status: IrlsStatus,
    /// Relative pivot tolerance turned absolute for the final R.
    pub pivot_tol: f64,
}

/// Implements the Iteratively Reweighted Least Squares algorithm for a family
/// given by its (bp, bpp) pair.
///
/// # Arguments
/// * `family` - Supplies the mean `bp` and variance `bpp` of the linear predictor
/// * `y` - Response vector
/// * `X` - Design matrix, already carrying an intercept column if one is wanted
/// * `beta0` - Starting coefficients
/// * `params` - Tolerance and iteration cap
pub fn irls<F: Family + ?Sized>(
    family: &F,
    y: &[f64],
    X: MatRef<'_, f64>,
    beta0: &[f64],
    params: &IrlsParams,
) -> Result<IrlsFit, LinalgErrors> {
    let n = X.nrows();
    let p = X.ncols();
    if y.len() != n {
        return Err(LinalgErrors::DimensionMismatch(format!(
            "response has {} entries but design has {} rows",
            y.len(),
            n
        )));
    }
    if beta0.len() != p {
        return Err(LinalgErrors::DimensionMismatch(format!(
            "starting point has {} entries but design has {} columns",
            beta0.len(),
            p
        )));
    }
    if n < p {
        return Err(LinalgErrors::InsufficientDegreesOfFreedom { n, p });
    }
    if params.max_iter == 0 {
        return Err(LinalgErrors::InvalidParameter(
            "IRLS needs at least one iteration".into(),
        ));
    }

    let mut beta = beta0.to_vec();
    let mut iter = 0;
    loop {
        iter += 1;
        let eta = mat_vec(X, &beta);
        let mut sqrt_w = Vec::with_capacity(n);
        let mut zw = Vec::with_capacity(n);
        for (i, (eta_i, y_i)) in eta.iter().zip(y.iter()).enumerate() {
            let mu = family.bp(*eta_i);
            let w = family.bpp(*eta_i);
            if !(w > 0.0 && w.is_finite() && mu.is_finite()) {
                return Err(LinalgErrors::NumericDegeneracy(format!(
                    "IRLS working weight {} at observation {} (linear predictor {})",
                    w, i, eta_i
                )));
            }
            let z = eta_i + (y_i - mu) / w;
            let s = w.sqrt();
            sqrt_w.push(s);
            zw.push(s * z);
        }

        let xw = X.scale_rows(&sqrt_w);
        let (q, r) = thin_qr(xw.as_ref());
        let pivot_tol = params.rank_tol * max_abs_diag(r.as_ref());
        let qtz = mat_t_vec(q.as_ref(), &zw);
        let beta_new = back_solve(r.as_ref(), &qtz, pivot_tol)?;
        if beta_new.iter().any(|b| !b.is_finite()) {
            return Err(LinalgErrors::NumericDegeneracy(format!(
                "IRLS produced non-finite coefficients at iteration {}",
                iter
            )));
        }

        // Use L Inf norm.
        let max_diff = izip!(beta.iter(), beta_new.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0f64, f64::max);
        beta = beta_new;
        log::debug!("IRLS iteration {}: max coefficient change {:e}", iter, max_diff);

        if max_diff < params.tol {
            return Ok(IrlsFit {
                coefficients: beta,
                q,
                r,
                iterations: iter,
                status: IrlsStatus::Converged,
                pivot_tol,
            });
        }
        if iter >= params.max_iter {
            log::warn!(
                "IRLS did not converge within {} iterations (last change {:e}). Returning the last iterate.",
                params.max_iter,
                max_diff
            );
            return Ok(IrlsFit {
                coefficients: beta,
                q,
                r,
                iterations: iter,
                status: IrlsStatus::MaxIterationsReached,
                pivot_tol,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{prepend_ones, rows_to_mat};
    use crate::linear::glm::family::{CustomFamily, GlmFamily};
    use approx::assert_abs_diff_eq;
    use itertools::Itertools;

    fn init() {
        if let Err(_) = pretty_env_logger::try_init() {}
    }

    fn poisson_data() -> (Vec<f64>, Mat<f64>) {
        let y = vec![2.0, 3.0, 6.0, 7.0, 8.0, 9.0, 10.0, 12.0, 15.0];
        let x = Mat::from_fn(9, 1, |i, _| (i + 1) as f64);
        (y, prepend_ones(x.as_ref()))
    }

    #[test]
    fn test_poisson_converges() {
        init();
        let (y, x) = poisson_data();
        let fit = irls(&GlmFamily::Poisson, &y, x.as_ref(), &[0.0, 0.0], &IrlsParams::default()).unwrap();
        assert_eq!(fit.status, IrlsStatus::Converged);
        assert_abs_diff_eq!(fit.coefficients[0], 0.98184503, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.coefficients[1], 0.19483768, epsilon = 1e-6);
        // Score equations: X^t (y - mu) = 0 at the optimum.
        let mu = mat_vec(x.as_ref(), &fit.coefficients).into_iter().map(f64::exp).collect_vec();
        let resid = y.iter().zip(mu.iter()).map(|(a, b)| a - b).collect_vec();
        for s in mat_t_vec(x.as_ref(), &resid) {
            assert_abs_diff_eq!(s, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_iteration_cap_is_not_an_error() {
        init();
        let (y, x) = poisson_data();
        let params = IrlsParams::new(2, 1e-12);
        let fit = irls(&GlmFamily::Poisson, &y, x.as_ref(), &[0.0, 0.0], &params).unwrap();
        assert_eq!(fit.status, IrlsStatus::MaxIterationsReached);
        assert_eq!(fit.iterations, 2);
    }

    #[test]
    fn test_identity_family_is_one_step_least_squares() {
        let gaussian = CustomFamily::new("gaussian", |eta| eta, |_| 1.0);
        let x = rows_to_mat(&[vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0]]).unwrap();
        let y = [1.0, 3.0, 5.2, 6.8];
        let fit = irls(&gaussian, &y, x.as_ref(), &[0.0, 0.0], &IrlsParams::default()).unwrap();
        // Second pass reproduces the first solution.
        assert_eq!(fit.iterations, 2);
        assert_abs_diff_eq!(fit.coefficients[1], 1.96, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_weights() {
        let bad = CustomFamily::new("bad", |eta| eta, |_| 0.0);
        let x = Mat::from_fn(3, 1, |_, _| 1.0);
        let err = irls(&bad, &[1.0, 2.0, 3.0], x.as_ref(), &[0.0], &IrlsParams::default()).unwrap_err();
        assert!(matches!(err, LinalgErrors::NumericDegeneracy(_)));
    }

    #[test]
    fn test_argument_checks() {
        let x = Mat::from_fn(3, 2, |i, j| (i * j) as f64);
        assert!(matches!(
            irls(&GlmFamily::Poisson, &[1.0, 2.0], x.as_ref(), &[0.0, 0.0], &IrlsParams::default()),
            Err(LinalgErrors::DimensionMismatch(_))
        ));
        assert!(matches!(
            irls(&GlmFamily::Poisson, &[1.0, 2.0, 3.0], x.as_ref(), &[0.0], &IrlsParams::default()),
            Err(LinalgErrors::DimensionMismatch(_))
        ));
        assert!(matches!(
            irls(&GlmFamily::Poisson, &[1.0, 2.0, 3.0], x.as_ref(), &[0.0, 0.0], &IrlsParams::new(0, 1e-8)),
            Err(LinalgErrors::InvalidParameter(_))
        ));
    }
}
