//! Basis expansions of a single numeric predictor into design columns.
pub mod polynomial;
pub mod spline;

pub use polynomial::{
    cosine, cosine_basis, legendre, legendre_basis, poly, DEFAULT_POLY_RANK_TOL,
};
pub use spline::{bs, bspline, full_knots};

use crate::linalg::LinalgErrors;
use crate::linear::DesignMatrix;
use faer::Mat;
use serde::{Deserialize, Serialize};

/// How to expand one numeric vector into several columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BasisSpec {
    Polynomial {
        degree: usize,
        #[serde(default)]
        raw: bool,
        #[serde(default = "default_poly_rank_tol")]
        rank_tol: f64,
    },
    Legendre {
        degree: usize,
    },
    Cosine {
        count: usize,
    },
    #[serde(rename = "bspline")]
    BSpline {
        degree: usize,
        knots: Vec<f64>,
        lb: f64,
        ub: f64,
        #[serde(default)]
        intercept: bool,
    },
}

fn default_poly_rank_tol() -> f64 {
    DEFAULT_POLY_RANK_TOL
}

impl BasisSpec {
    /// Orthogonal polynomial with the default rank tolerance.
    pub fn orthogonal_poly(degree: usize) -> Self {
        BasisSpec::Polynomial {
            degree,
            raw: false,
            rank_tol: DEFAULT_POLY_RANK_TOL,
        }
    }

    /// Cubic spline without intercept column, the usual choice next to a
    /// model intercept.
    pub fn cubic_spline(knots: Vec<f64>, lb: f64, ub: f64) -> Self {
        BasisSpec::BSpline {
            degree: 3,
            knots,
            lb,
            ub,
            intercept: false,
        }
    }

    /// Spline with `n_knots` interior knots at evenly spaced sample quantiles
    /// of `x` and bounds at the sample range.
    pub fn bspline_quantile(
        x: &[f64],
        degree: usize,
        n_knots: usize,
        intercept: bool,
    ) -> Result<Self, LinalgErrors> {
        if x.is_empty() || x.iter().any(|v| !v.is_finite()) {
            return Err(LinalgErrors::InvalidBasisConfiguration(
                "quantile knots need a non-empty finite sample".into(),
            ));
        }
        let mut sorted = x.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let knots = (1..=n_knots)
            .map(|k| quantile_sorted(&sorted, k as f64 / (n_knots + 1) as f64))
            .collect();
        Ok(BasisSpec::BSpline {
            degree,
            knots,
            lb: sorted[0],
            ub: sorted[sorted.len() - 1],
            intercept,
        })
    }

    /// Number of columns the expansion produces.
    pub fn n_columns(&self) -> usize {
        match self {
            BasisSpec::Polynomial { degree, .. } | BasisSpec::Legendre { degree } => *degree,
            BasisSpec::Cosine { count } => *count,
            BasisSpec::BSpline {
                degree,
                knots,
                intercept,
                ..
            } => knots.len() + degree + 1 - (!intercept) as usize,
        }
    }

    pub fn validate(&self) -> Result<(), LinalgErrors> {
        match self {
            BasisSpec::Polynomial { degree, .. } | BasisSpec::Legendre { degree } if *degree == 0 => {
                Err(LinalgErrors::InvalidBasisConfiguration(
                    "degree must be at least 1".into(),
                ))
            }
            BasisSpec::Polynomial { rank_tol, .. } if !(*rank_tol >= 0.0 && rank_tol.is_finite()) => {
                Err(LinalgErrors::InvalidBasisConfiguration(format!(
                    "rank tolerance must be finite and non-negative, got {}",
                    rank_tol
                )))
            }
            BasisSpec::Cosine { count } if *count == 0 => Err(
                LinalgErrors::InvalidBasisConfiguration("count must be at least 1".into()),
            ),
            BasisSpec::BSpline {
                degree,
                knots,
                lb,
                ub,
                intercept,
            } => {
                full_knots(*degree, knots, *lb, *ub)?;
                if knots.len() + degree + 1 <= (!intercept) as usize {
                    return Err(LinalgErrors::InvalidBasisConfiguration(
                        "spline basis would have no columns".into(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn expand(&self, x: &[f64]) -> Result<Mat<f64>, LinalgErrors> {
        self.validate()?;
        match self {
            BasisSpec::Polynomial {
                degree,
                raw,
                rank_tol,
            } => poly(x, *degree, *raw, *rank_tol),
            BasisSpec::Legendre { degree } => legendre_basis(x, *degree),
            BasisSpec::Cosine { count } => cosine_basis(x, *count),
            BasisSpec::BSpline {
                degree,
                knots,
                lb,
                ub,
                intercept,
            } => bs(x, *degree, *intercept, knots, *lb, *ub),
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            BasisSpec::Polynomial { .. } => "poly",
            BasisSpec::Legendre { .. } => "legendre",
            BasisSpec::Cosine { .. } => "cosine",
            BasisSpec::BSpline { .. } => "bs",
        }
    }

    /// Expands `x` into a design with columns named like `poly(x)1`.
    pub fn to_design(&self, x: &[f64], var_name: &str) -> Result<DesignMatrix, LinalgErrors> {
        let m = self.expand(x)?;
        let names = (1..=m.ncols())
            .map(|j| format!("{}({}){}", self.prefix(), var_name, j))
            .collect();
        DesignMatrix::new(m, names)
    }
}

/// Linear interpolation between order statistics.
fn quantile_sorted(sorted: &[f64], prob: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * prob;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_spec_expansion_and_names() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
        let spec = BasisSpec::orthogonal_poly(2);
        let d = spec.to_design(&x, "age").unwrap();
        assert_eq!(d.names(), &["poly(age)1".to_string(), "poly(age)2".to_string()]);
        assert_eq!(d.nrows(), 10);

        let spline = BasisSpec::cubic_spline(vec![0.3, 0.6], 0.0, 1.0);
        assert_eq!(spline.n_columns(), 5);
        let d = spline.to_design(&x, "t").unwrap();
        assert_eq!(d.ncols(), 5);
        assert_eq!(d.names()[4], "bs(t)5");
    }

    #[test]
    fn test_polynomial_rank_tol_from_config() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 1e-4).collect();
        let strict = BasisSpec::orthogonal_poly(4);
        assert!(strict.expand(&x).is_err());
        let loose = BasisSpec::Polynomial {
            degree: 4,
            raw: false,
            rank_tol: 1e-15,
        };
        assert_eq!(loose.expand(&x).unwrap().ncols(), 4);
    }

    #[test]
    fn test_validate() {
        assert!(BasisSpec::Legendre { degree: 0 }.validate().is_err());
        assert!(BasisSpec::Cosine { count: 0 }.expand(&[0.0]).is_err());
        assert!(BasisSpec::cubic_spline(vec![2.0], 0.0, 1.0).validate().is_err());
        assert!(BasisSpec::Cosine { count: 3 }.validate().is_ok());
        let negative = BasisSpec::Polynomial {
            degree: 2,
            raw: false,
            rank_tol: -1.0,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_quantile_knots() {
        let x: Vec<f64> = (0..=100).rev().map(|i| i as f64).collect();
        let spec = BasisSpec::bspline_quantile(&x, 3, 3, false).unwrap();
        match spec {
            BasisSpec::BSpline { knots, lb, ub, .. } => {
                assert_eq!(lb, 0.0);
                assert_eq!(ub, 100.0);
                assert_abs_diff_eq!(knots[0], 25.0, epsilon = 1e-12);
                assert_abs_diff_eq!(knots[1], 50.0, epsilon = 1e-12);
                assert_abs_diff_eq!(knots[2], 75.0, epsilon = 1e-12);
            }
            _ => panic!("expected a spline"),
        }
        assert!(BasisSpec::bspline_quantile(&[], 3, 2, true).is_err());
    }
}
