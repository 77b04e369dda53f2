//! Linear models, GLMs fit by IRLS, basis expansions and PCA on dense `faer`
//! matrices.
pub mod basis;
pub mod linalg;
pub mod linear;
pub mod num;
pub mod stats_utils;

pub use basis::{
    bs as spline_basis, cosine_basis, legendre_basis, poly as polynomial_basis, BasisSpec,
    DEFAULT_POLY_RANK_TOL,
};
pub use linalg::LinalgErrors;
pub use linear::{
    batch::{fit_glm_many, fit_lm_many},
    design::DesignMatrix,
    glm::{CustomFamily, Family, Glm, GlmFamily, GlmOptions, IrlsParams, IrlsStatus},
    lr::{Lm, LmOptions},
    predict::{IntervalKind, Predict, Prediction, PredictionScale},
    CoefficientSummary, LinearModel,
};
pub use crate::num::pca::Pca;

use faer::MatRef;

fn named_design(x: MatRef<'_, f64>, column_names: &[&str]) -> Result<DesignMatrix, LinalgErrors> {
    if column_names.is_empty() {
        Ok(DesignMatrix::from_mat(x.to_owned()))
    } else {
        DesignMatrix::new(
            x.to_owned(),
            column_names.iter().map(|s| s.to_string()).collect(),
        )
    }
}

/// Fits y ~ X by QR. An empty `column_names` gives the default names x1..xp.
pub fn fit_linear_model(
    y: &[f64],
    x: MatRef<'_, f64>,
    column_names: &[&str],
    add_intercept: bool,
) -> Result<Lm, LinalgErrors> {
    let design = named_design(x, column_names)?;
    Lm::fit(y, &design, &LmOptions::new(add_intercept))
}

/// Fits a GLM by IRLS from a zero start with the default tolerance.
pub fn fit_glm(
    y: &[f64],
    x: MatRef<'_, f64>,
    column_names: &[&str],
    family: GlmFamily,
    add_intercept: bool,
    max_iter: usize,
) -> Result<Glm, LinalgErrors> {
    let design = named_design(x, column_names)?;
    let options = GlmOptions {
        add_intercept,
        irls: IrlsParams {
            max_iter,
            ..Default::default()
        },
    };
    Glm::fit(y, &design, family, &options)
}

pub fn fit_pca(x: MatRef<'_, f64>, column_names: &[&str]) -> Result<Pca, LinalgErrors> {
    Pca::fit(&named_design(x, column_names)?)
}

/// Predictions and standard errors on new rows. `new_x` excludes the intercept column.
pub fn predict<'a, M: Predict>(
    model: &'a M,
    new_x: MatRef<'_, f64>,
    scale: PredictionScale,
) -> Result<Prediction<'a, M>, LinalgErrors> {
    model.prediction(new_x, scale)
}
