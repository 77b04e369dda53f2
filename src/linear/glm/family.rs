//! Exponential families described by their cumulant derivative `bp` and its
//! derivative `bpp`. The mean is `bp(eta)` and the variance function is `bpp(eta)`.
use crate::linalg::LinalgErrors;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub trait Family: Send + Sync {
    fn name(&self) -> &str;

    /// Mean as a function of the linear predictor.
    fn bp(&self, eta: f64) -> f64;

    /// Derivative of `bp`, the variance of the response at `eta`.
    fn bpp(&self, eta: f64) -> f64;

    /// Unit deviance d(y, mu). Families without one skip deviance diagnostics.
    fn unit_deviance(&self, _y: f64, _mu: f64) -> Option<f64> {
        None
    }
}

type ScalarFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;
type DevianceFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// A user supplied (bp, bpp) pair.
#[derive(Clone)]
pub struct CustomFamily {
    name: String,
    bp: ScalarFn,
    bpp: ScalarFn,
    deviance: Option<DevianceFn>,
}

impl CustomFamily {
    pub fn new<B, V>(name: &str, bp: B, bpp: V) -> Self
    where
        B: Fn(f64) -> f64 + Send + Sync + 'static,
        V: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        CustomFamily {
            name: name.to_string(),
            bp: Arc::new(bp),
            bpp: Arc::new(bpp),
            deviance: None,
        }
    }

    pub fn with_unit_deviance<D>(mut self, deviance: D) -> Self
    where
        D: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.deviance = Some(Arc::new(deviance));
        self
    }
}

impl fmt::Debug for CustomFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFamily")
            .field("name", &self.name)
            .field("has_deviance", &self.deviance.is_some())
            .finish()
    }
}

impl Family for CustomFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn bp(&self, eta: f64) -> f64 {
        (self.bp)(eta)
    }

    fn bpp(&self, eta: f64) -> f64 {
        (self.bpp)(eta)
    }

    fn unit_deviance(&self, y: f64, mu: f64) -> Option<f64> {
        self.deviance.as_ref().map(|d| d(y, mu))
    }
}

#[derive(Debug, Clone, Default)]
pub enum GlmFamily {
    #[default]
    Logistic,
    Poisson,
    Custom(CustomFamily),
}

impl FromStr for GlmFamily {
    type Err = LinalgErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "logit" | "binomial" => Ok(GlmFamily::Logistic),
            "poisson" => Ok(GlmFamily::Poisson),
            _ => Err(LinalgErrors::InvalidParameter(format!(
                "unknown family '{}', expected 'logistic' or 'poisson'",
                s
            ))),
        }
    }
}

#[inline]
fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// y ln(y / mu), taken as 0 when y is 0.
#[inline]
fn y_log_y(y: f64, mu: f64) -> f64 {
    if y == 0.0 {
        0.0
    } else {
        y * (y / mu).ln()
    }
}

impl Family for GlmFamily {
    fn name(&self) -> &str {
        match self {
            GlmFamily::Logistic => "logistic",
            GlmFamily::Poisson => "poisson",
            GlmFamily::Custom(c) => c.name(),
        }
    }

    fn bp(&self, eta: f64) -> f64 {
        match self {
            GlmFamily::Logistic => sigmoid(eta),
            GlmFamily::Poisson => eta.exp(),
            GlmFamily::Custom(c) => c.bp(eta),
        }
    }

    fn bpp(&self, eta: f64) -> f64 {
        match self {
            GlmFamily::Logistic => {
                let s = sigmoid(eta);
                s * (1.0 - s)
            }
            GlmFamily::Poisson => eta.exp(),
            GlmFamily::Custom(c) => c.bpp(eta),
        }
    }

    fn unit_deviance(&self, y: f64, mu: f64) -> Option<f64> {
        match self {
            GlmFamily::Logistic => Some(2.0 * (y_log_y(y, mu) + y_log_y(1.0 - y, 1.0 - mu))),
            GlmFamily::Poisson => Some(2.0 * (y_log_y(y, mu) - (y - mu))),
            GlmFamily::Custom(c) => c.unit_deviance(y, mu),
        }
    }
}
