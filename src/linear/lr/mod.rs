//! Ordinary least squares by thin QR.
use super::{design::DesignMatrix, utils::RowWise, CoefficientSummary, LinearModel};
use crate::linalg::{
    back_solve, back_solve_mat, mat_t_vec, mat_vec, max_abs_diag, row_squared_norms, thin_qr,
    LinalgErrors,
};
use crate::stats_utils::{fisher_snedecor_sf, student_t_ppf, student_t_sf};
use faer::{Mat, MatRef};
use itertools::{izip, Itertools};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmOptions {
    pub add_intercept: bool,
    /// Pivots of R smaller than `rank_tol * max|r_ii|` count as zero.
    pub rank_tol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        LmOptions {
            add_intercept: true,
            rank_tol: 1e-12,
        }
    }
}

impl LmOptions {
    pub fn new(add_intercept: bool) -> Self {
        LmOptions {
            add_intercept,
            ..Default::default()
        }
    }
}

/// A fitted linear model y ~ X beta.
#[derive(Debug, Clone)]
pub struct Lm {
    names: Vec<String>,
    options: LmOptions,
    y: Vec<f64>,
    x: Mat<f64>,
    q: Mat<f64>,
    r: Mat<f64>,
    ri: Mat<f64>,
    qty: Vec<f64>,
    coefficients: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    df: usize,
    rss: f64,
    rse: f64,
    se: Vec<f64>,
    t: Vec<f64>,
    p_values: Vec<f64>,
    ybar: f64,
    ssy: f64,
    r_squared: f64,
    adj_r_squared: f64,
    f_statistic: f64,
    f_p_value: f64,
    leverage: Vec<f64>,
    studentized: Vec<f64>,
}

impl Lm {
    pub fn fit(y: &[f64], x: &DesignMatrix, options: &LmOptions) -> Result<Self, LinalgErrors> {
        if y.len() != x.nrows() {
            return Err(LinalgErrors::DimensionMismatch(format!(
                "response has {} entries but design has {} rows",
                y.len(),
                x.nrows()
            )));
        }
        let design = if options.add_intercept {
            x.with_intercept()
        } else {
            x.clone()
        };
        let n = design.nrows();
        let p = design.ncols();
        if p == 0 {
            return Err(LinalgErrors::InvalidParameter(
                "design has no columns and no intercept was requested".into(),
            ));
        }
        if n < p {
            return Err(LinalgErrors::InsufficientDegreesOfFreedom { n, p });
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(LinalgErrors::NumericDegeneracy(format!(
                "response has a non-finite value at row {}",
                i
            )));
        }
        let x_ref = design.as_ref();
        if !x_ref.is_all_finite() {
            return Err(LinalgErrors::NumericDegeneracy(
                "design contains non-finite values".into(),
            ));
        }

        let (q, r) = thin_qr(x_ref);
        let pivot_tol = options.rank_tol * max_abs_diag(r.as_ref());
        let qty = mat_t_vec(q.as_ref(), y);
        let coefficients = back_solve(r.as_ref(), &qty, pivot_tol)?;
        if coefficients.iter().any(|b| !b.is_finite()) {
            return Err(LinalgErrors::NumericDegeneracy(
                "least squares solution is not finite".into(),
            ));
        }
        let ri = back_solve_mat(r.as_ref(), Mat::<f64>::identity(p, p).as_ref(), pivot_tol)?;

        let fitted = mat_vec(q.as_ref(), &qty);
        let residuals = y.iter().zip(fitted.iter()).map(|(a, b)| a - b).collect_vec();
        let rss = super::utils::sum_sq(&residuals);
        let df = n - p;

        let rse = if df > 0 {
            (rss / df as f64).sqrt()
        } else {
            log::warn!(
                "Linear model has {} observations for {} parameters. The fit is exact and carries no error estimate.",
                n,
                p
            );
            0.0
        };

        let se = ri.as_ref().row_norms().into_iter().map(|v| v * rse).collect_vec();
        let (t, p_values) = if df > 0 {
            let t = coefficients.iter().zip(se.iter()).map(|(b, s)| b / s).collect_vec();
            let p_values = t
                .iter()
                .map(|ti| two_sided_t(*ti, df as f64))
                .collect::<Result<Vec<_>, _>>()?;
            (t, p_values)
        } else {
            (vec![f64::NAN; p], vec![f64::NAN; p])
        };

        let ybar = y.iter().sum::<f64>() / n as f64;
        let ssy = y.iter().fold(0f64, |acc, yi| acc + (yi - ybar) * (yi - ybar));
        let r_squared = 1.0 - rss / ssy;
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df as f64;

        // k counts every column but one, whether or not that column is an intercept.
        let k = p - 1;
        let (f_statistic, f_p_value) = if k > 0 && df > 0 {
            let f = ((ssy - rss) / k as f64) / (rss / df as f64);
            let pf = if f.is_nan() {
                f64::NAN
            } else {
                fisher_snedecor_sf(f, k as f64, df as f64)?
            };
            (f, pf)
        } else {
            (f64::NAN, f64::NAN)
        };

        let leverage = row_squared_norms(q.as_ref());
        let studentized = if df > 0 {
            izip!(residuals.iter(), leverage.iter())
                .map(|(res, h)| res / (rse * (1.0 - h).sqrt()))
                .collect_vec()
        } else {
            vec![f64::NAN; n]
        };

        let names = design.names().to_vec();
        Ok(Lm {
            names,
            options: *options,
            y: y.to_vec(),
            x: design.into_inner(),
            q,
            r,
            ri,
            qty,
            coefficients,
            fitted,
            residuals,
            df,
            rss,
            rse,
            se,
            t,
            p_values,
            ybar,
            ssy,
            r_squared,
            adj_r_squared,
            f_statistic,
            f_p_value,
            leverage,
            studentized,
        })
    }

    pub fn options(&self) -> &LmOptions {
        &self.options
    }

    pub fn response(&self) -> &[f64] {
        &self.y
    }

    /// The design actually fitted, including the intercept column if any.
    pub fn design(&self) -> MatRef<'_, f64> {
        self.x.as_ref()
    }

    pub fn q(&self) -> MatRef<'_, f64> {
        self.q.as_ref()
    }

    pub fn r(&self) -> MatRef<'_, f64> {
        self.r.as_ref()
    }

    pub fn qty(&self) -> &[f64] {
        &self.qty
    }

    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub fn n_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Residual degrees of freedom n - p.
    pub fn df(&self) -> usize {
        self.df
    }

    pub fn rss(&self) -> f64 {
        self.rss
    }

    /// Residual standard error.
    pub fn rse(&self) -> f64 {
        self.rse
    }

    pub fn std_errors(&self) -> &[f64] {
        &self.se
    }

    pub fn t_values(&self) -> &[f64] {
        &self.t
    }

    pub fn p_values(&self) -> &[f64] {
        &self.p_values
    }

    pub fn y_mean(&self) -> f64 {
        self.ybar
    }

    /// Total sum of squares about the mean.
    pub fn tss(&self) -> f64 {
        self.ssy
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn adj_r_squared(&self) -> f64 {
        self.adj_r_squared
    }

    pub fn f_statistic(&self) -> f64 {
        self.f_statistic
    }

    pub fn f_p_value(&self) -> f64 {
        self.f_p_value
    }

    /// Diagonal of the hat matrix.
    pub fn leverage(&self) -> &[f64] {
        &self.leverage
    }

    pub fn studentized_residuals(&self) -> &[f64] {
        &self.studentized
    }

    /// rse^2 (R^t R)^-1, formed as rse^2 R^-1 R^-t.
    pub fn covariance(&self) -> Mat<f64> {
        let ri = self.ri.as_ref();
        let cov = ri * ri.transpose();
        let s2 = self.rse * self.rse;
        Mat::from_fn(cov.nrows(), cov.ncols(), |i, j| cov[(i, j)] * s2)
    }

    /// Gaussian log likelihood at the maximum likelihood variance rss / n.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.n_obs() as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.rss / n).ln() + 1.0)
    }

    /// The error variance counts as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * (self.n_params() + 1) as f64
    }

    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + (self.n_obs() as f64).ln() * (self.n_params() + 1) as f64
    }

    /// Confidence intervals for the coefficients from t quantiles.
    pub fn confint(&self, level: f64) -> Result<Vec<(f64, f64)>, LinalgErrors> {
        check_level(level)?;
        if self.df == 0 {
            return Err(LinalgErrors::InsufficientDegreesOfFreedom {
                n: self.n_obs(),
                p: self.n_params(),
            });
        }
        let q = student_t_ppf(0.5 + level / 2.0, self.df as f64)?;
        Ok(self
            .coefficients
            .iter()
            .zip(self.se.iter())
            .map(|(b, s)| (b - q * s, b + q * s))
            .collect())
    }

    pub fn summary(&self) -> Vec<CoefficientSummary> {
        izip!(
            self.names.iter(),
            self.coefficients.iter(),
            self.se.iter(),
            self.t.iter(),
            self.p_values.iter()
        )
        .map(|(name, b, s, t, p)| CoefficientSummary {
            name: name.clone(),
            estimate: *b,
            std_error: *s,
            statistic: *t,
            p_value: *p,
        })
        .collect()
    }
}

impl LinearModel for Lm {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn add_intercept(&self) -> bool {
        self.options.add_intercept
    }

    fn r_inverse(&self) -> MatRef<'_, f64> {
        self.ri.as_ref()
    }

    fn dispersion_scale(&self) -> f64 {
        self.rse
    }
}

#[inline]
fn two_sided_t(t: f64, df: f64) -> Result<f64, LinalgErrors> {
    if t.is_nan() {
        Ok(f64::NAN)
    } else {
        Ok(2.0 * student_t_sf(t.abs(), df)?)
    }
}

pub(crate) fn check_level(level: f64) -> Result<(), LinalgErrors> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(LinalgErrors::InvalidParameter(format!(
            "confidence level must be in (0, 1), got {}",
            level
        )))
    }
}
