//! Generalized linear models fit by IRLS.
pub mod family;
pub mod irls;

pub use family::{CustomFamily, Family, GlmFamily};
pub use irls::{irls, IrlsFit, IrlsParams, IrlsStatus};

use super::{design::DesignMatrix, lr::check_level, utils::RowWise, CoefficientSummary, LinearModel};
use crate::linalg::{back_solve_mat, mat_vec, LinalgErrors};
use crate::stats_utils::{normal_ppf, normal_sf};
use faer::{Mat, MatRef};
use itertools::{izip, Itertools};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlmOptions {
    pub add_intercept: bool,
    pub irls: IrlsParams,
}

impl Default for GlmOptions {
    fn default() -> Self {
        GlmOptions {
            add_intercept: true,
            irls: IrlsParams::default(),
        }
    }
}

/// A GLM fitted by IRLS. Dispersion is fixed at 1, so inference uses the
/// normal distribution.
#[derive(Debug, Clone)]
pub struct Glm {
    names: Vec<String>,
    options: GlmOptions,
    family: GlmFamily,
    y: Vec<f64>,
    x: Mat<f64>,
    q: Mat<f64>,
    r: Mat<f64>,
    ri: Mat<f64>,
    coefficients: Vec<f64>,
    se: Vec<f64>,
    z: Vec<f64>,
    p_values: Vec<f64>,
    linear_predictor: Vec<f64>,
    fitted: Vec<f64>,
    iterations: usize,
    status: IrlsStatus,
}

impl Glm {
    /// Fits from a zero starting point.
    pub fn fit(
        y: &[f64],
        x: &DesignMatrix,
        family: GlmFamily,
        options: &GlmOptions,
    ) -> Result<Self, LinalgErrors> {
        let p = x.ncols() + options.add_intercept as usize;
        Self::fit_with_start(y, x, family, options, &vec![0f64; p])
    }

    /// `beta0` includes the intercept, first, when one is requested.
    pub fn fit_with_start(
        y: &[f64],
        x: &DesignMatrix,
        family: GlmFamily,
        options: &GlmOptions,
        beta0: &[f64],
    ) -> Result<Self, LinalgErrors> {
        let design = if options.add_intercept {
            x.with_intercept()
        } else {
            x.clone()
        };
        if design.ncols() == 0 {
            return Err(LinalgErrors::InvalidParameter(
                "design has no columns and no intercept was requested".into(),
            ));
        }
        let fit = irls(&family, y, design.as_ref(), beta0, &options.irls)?;
        let p = design.ncols();
        let ri = back_solve_mat(
            fit.r.as_ref(),
            Mat::<f64>::identity(p, p).as_ref(),
            fit.pivot_tol,
        )?;

        let se = ri.as_ref().row_norms();
        let z = fit
            .coefficients
            .iter()
            .zip(se.iter())
            .map(|(b, s)| b / s)
            .collect_vec();
        let p_values = z
            .iter()
            .map(|zi| normal_sf(zi.abs()).map(|q| 2.0 * q))
            .collect::<Result<Vec<_>, _>>()?;
        let linear_predictor = mat_vec(design.as_ref(), &fit.coefficients);
        let fitted = linear_predictor.iter().map(|eta| family.bp(*eta)).collect_vec();

        log::debug!(
            "GLM ({}) finished after {} IRLS iterations: {:?}",
            family.name(),
            fit.iterations,
            fit.status
        );

        Ok(Glm {
            names: design.names().to_vec(),
            options: *options,
            family,
            y: y.to_vec(),
            x: design.into_inner(),
            q: fit.q,
            r: fit.r,
            ri,
            coefficients: fit.coefficients,
            se,
            z,
            p_values,
            linear_predictor,
            fitted,
            iterations: fit.iterations,
            status: fit.status,
        })
    }

    pub fn family(&self) -> &GlmFamily {
        &self.family
    }

    pub fn options(&self) -> &GlmOptions {
        &self.options
    }

    pub fn response(&self) -> &[f64] {
        &self.y
    }

    pub fn design(&self) -> MatRef<'_, f64> {
        self.x.as_ref()
    }

    /// Q of the final weighted design.
    pub fn q(&self) -> MatRef<'_, f64> {
        self.q.as_ref()
    }

    /// R of the final weighted design.
    pub fn r(&self) -> MatRef<'_, f64> {
        self.r.as_ref()
    }

    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub fn n_params(&self) -> usize {
        self.coefficients.len()
    }

    pub fn std_errors(&self) -> &[f64] {
        &self.se
    }

    /// Wald z statistics.
    pub fn z_values(&self) -> &[f64] {
        &self.z
    }

    pub fn p_values(&self) -> &[f64] {
        &self.p_values
    }

    pub fn linear_predictor(&self) -> &[f64] {
        &self.linear_predictor
    }

    /// Fitted means bp(X beta).
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn status(&self) -> IrlsStatus {
        self.status
    }

    pub fn converged(&self) -> bool {
        self.status == IrlsStatus::Converged
    }

    /// (R^t R)^-1 from the final weighted R.
    pub fn covariance(&self) -> Mat<f64> {
        let ri = self.ri.as_ref();
        ri * ri.transpose()
    }

    pub fn response_residuals(&self) -> Vec<f64> {
        izip!(self.y.iter(), self.fitted.iter())
            .map(|(y, mu)| y - mu)
            .collect()
    }

    /// (y - mu) / sqrt(V), with V = bpp(eta).
    pub fn pearson_residuals(&self) -> Vec<f64> {
        izip!(self.y.iter(), self.fitted.iter(), self.linear_predictor.iter())
            .map(|(y, mu, eta)| (y - mu) / self.family.bpp(*eta).sqrt())
            .collect()
    }

    /// Sum of unit deviances, if the family defines them.
    pub fn deviance(&self) -> Option<f64> {
        izip!(self.y.iter(), self.fitted.iter())
            .map(|(y, mu)| self.family.unit_deviance(*y, *mu))
            .sum()
    }

    /// Deviance of the model with no predictors: constant mean ybar with an
    /// intercept, bp(0) without.
    pub fn null_deviance(&self) -> Option<f64> {
        let mu0 = if self.options.add_intercept {
            self.y.iter().sum::<f64>() / self.n_obs() as f64
        } else {
            self.family.bp(0.0)
        };
        self.y
            .iter()
            .map(|y| self.family.unit_deviance(*y, mu0))
            .sum()
    }

    /// sign(y - mu) sqrt(d(y, mu))
    pub fn deviance_residuals(&self) -> Option<Vec<f64>> {
        izip!(self.y.iter(), self.fitted.iter())
            .map(|(y, mu)| {
                self.family
                    .unit_deviance(*y, *mu)
                    .map(|d| (y - mu).signum() * d.max(0.0).sqrt())
            })
            .collect()
    }

    /// Wald intervals from normal quantiles.
    pub fn confint(&self, level: f64) -> Result<Vec<(f64, f64)>, LinalgErrors> {
        check_level(level)?;
        let q = normal_ppf(0.5 + level / 2.0)?;
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
            self.z.iter(),
            self.p_values.iter()
        )
        .map(|(name, b, s, z, p)| CoefficientSummary {
            name: name.clone(),
            estimate: *b,
            std_error: *s,
            statistic: *z,
            p_value: *p,
        })
        .collect()
    }
}

impl LinearModel for Glm {
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
        1.0
    }
}
