pub mod batch;
pub mod design;
pub mod glm;
pub mod lr;
pub mod predict;
pub mod utils;

pub use crate::linalg::LinalgErrors;
pub use design::DesignMatrix;

use crate::linalg::{mat_vec, prepend_ones};
use faer::{Mat, MatRef};
use serde::{Deserialize, Serialize};

/// One row of a coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSummary {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    /// t statistic for linear models, Wald z statistic for GLMs.
    pub statistic: f64,
    pub p_value: f64,
}

/// What prediction needs from a fitted `Lm` or `Glm`: named coefficients,
/// the intercept flag, and R^-1 with a dispersion scale for propagating
/// standard errors to new rows.
pub trait LinearModel {
    /// Coefficient names, including `(Intercept)` when present.
    fn names(&self) -> &[String];

    /// Coefficients, in the order of `names`.
    fn coefficients(&self) -> &[f64];

    fn add_intercept(&self) -> bool;

    /// Inverse of the R factor of the final (possibly weighted) design.
    fn r_inverse(&self) -> MatRef<'_, f64>;

    /// Scale applied to the propagated standard errors. The residual standard
    /// error for a linear model, 1 for families with fixed dispersion.
    fn dispersion_scale(&self) -> f64;

    /// Number of predictor columns a new design must have.
    fn n_predictors(&self) -> usize {
        self.coefficients().len() - self.add_intercept() as usize
    }

    /// Checks the column count of a new design and prepends the intercept
    /// column when the model has one.
    fn prepare_design(&self, x: MatRef<'_, f64>) -> Result<Mat<f64>, LinalgErrors> {
        if x.ncols() != self.n_predictors() {
            return Err(LinalgErrors::DimensionMismatch(format!(
                "model has {} predictors but new design has {} columns",
                self.n_predictors(),
                x.ncols()
            )));
        }
        if self.add_intercept() {
            Ok(prepend_ones(x))
        } else {
            Ok(x.to_owned())
        }
    }

    /// Runs the linear predictor on a new design (without intercept column).
    fn predict(&self, x: MatRef<'_, f64>) -> Result<Vec<f64>, LinalgErrors> {
        let design = self.prepare_design(x)?;
        Ok(mat_vec(design.as_ref(), self.coefficients()))
    }
}
