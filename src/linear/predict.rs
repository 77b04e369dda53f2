//! Predictions from a fitted model on new design rows, with standard errors
//! propagated through R^-1.
use super::{glm::Family, glm::Glm, lr::check_level, lr::Lm, utils::RowWise, LinearModel};
use crate::linalg::{mat_vec, LinalgErrors};
use crate::stats_utils::student_t_ppf;
use faer::{Mat, MatRef};
use itertools::{izip, Itertools};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PredictionScale {
    /// The linear predictor X beta.
    #[default]
    Link,
    /// The mean bp(X beta).
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    /// Interval for the mean response.
    Confidence,
    /// Interval for a new observation.
    Prediction,
}

/// Predictions on a new design. Holds a shared reference to the model it came from.
#[derive(Debug, Clone)]
pub struct Prediction<'a, M: LinearModel> {
    model: &'a M,
    design: Mat<f64>,
    linear_predictor: Vec<f64>,
    fitted: Vec<f64>,
    se: Vec<f64>,
    scale: PredictionScale,
}

/// Models that can produce a [`Prediction`].
pub trait Predict: LinearModel + Sized {
    fn prediction(
        &self,
        x: MatRef<'_, f64>,
        scale: PredictionScale,
    ) -> Result<Prediction<'_, Self>, LinalgErrors>;
}

/// Linear predictor and its standard error, rownorm(X R^-1) * scale.
fn link_scale<M: LinearModel>(
    model: &M,
    x: MatRef<'_, f64>,
) -> Result<(Mat<f64>, Vec<f64>, Vec<f64>), LinalgErrors> {
    let design = model.prepare_design(x)?;
    let lp = mat_vec(design.as_ref(), model.coefficients());
    let xri = design.as_ref() * model.r_inverse();
    let scale = model.dispersion_scale();
    let se = xri.as_ref().row_norms().into_iter().map(|v| v * scale).collect_vec();
    Ok((design, lp, se))
}

impl<'a, M: LinearModel> Prediction<'a, M> {
    pub fn model(&self) -> &'a M {
        self.model
    }

    /// New design including the intercept column, if the model has one.
    pub fn design(&self) -> MatRef<'_, f64> {
        self.design.as_ref()
    }

    pub fn linear_predictor(&self) -> &[f64] {
        &self.linear_predictor
    }

    /// Predictions on the requested scale.
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    pub fn std_errors(&self) -> &[f64] {
        &self.se
    }

    pub fn scale(&self) -> PredictionScale {
        self.scale
    }
}

impl<'a> Prediction<'a, Lm> {
    pub fn new(model: &'a Lm, x: MatRef<'_, f64>) -> Result<Self, LinalgErrors> {
        let (design, lp, se) = link_scale(model, x)?;
        Ok(Prediction {
            model,
            design,
            fitted: lp.clone(),
            linear_predictor: lp,
            se,
            scale: PredictionScale::Response,
        })
    }

    /// Two sided intervals from t quantiles on the residual degrees of freedom.
    /// Prediction intervals add the residual variance to the mean's.
    pub fn interval(&self, level: f64, kind: IntervalKind) -> Result<Vec<(f64, f64)>, LinalgErrors> {
        check_level(level)?;
        let df = self.model.df();
        if df == 0 {
            return Err(LinalgErrors::InsufficientDegreesOfFreedom {
                n: self.model.n_obs(),
                p: self.model.n_params(),
            });
        }
        let q = student_t_ppf(0.5 + level / 2.0, df as f64)?;
        let s2 = match kind {
            IntervalKind::Confidence => 0.0,
            IntervalKind::Prediction => self.model.rse() * self.model.rse(),
        };
        Ok(izip!(self.fitted.iter(), self.se.iter())
            .map(|(f, s)| {
                let half = q * (s * s + s2).sqrt();
                (f - half, f + half)
            })
            .collect())
    }
}

impl<'a> Prediction<'a, Glm> {
    /// On the response scale the standard error is carried by the delta
    /// method: se(mu) = bpp(eta) se(eta).
    pub fn new(model: &'a Glm, x: MatRef<'_, f64>, scale: PredictionScale) -> Result<Self, LinalgErrors> {
        let (design, lp, se_lp) = link_scale(model, x)?;
        let (fitted, se) = match scale {
            PredictionScale::Link => (lp.clone(), se_lp),
            PredictionScale::Response => {
                let family = model.family();
                let fitted = lp.iter().map(|eta| family.bp(*eta)).collect_vec();
                let se = izip!(lp.iter(), se_lp.iter())
                    .map(|(eta, s)| s * family.bpp(*eta))
                    .collect_vec();
                (fitted, se)
            }
        };
        Ok(Prediction {
            model,
            design,
            linear_predictor: lp,
            fitted,
            se,
            scale,
        })
    }
}

impl Predict for Lm {
    /// The identity link makes both scales the same.
    fn prediction(
        &self,
        x: MatRef<'_, f64>,
        _scale: PredictionScale,
    ) -> Result<Prediction<'_, Self>, LinalgErrors> {
        Prediction::<Lm>::new(self, x)
    }
}

impl Predict for Glm {
    fn prediction(
        &self,
        x: MatRef<'_, f64>,
        scale: PredictionScale,
    ) -> Result<Prediction<'_, Self>, LinalgErrors> {
        Prediction::<Glm>::new(self, x, scale)
    }
}
