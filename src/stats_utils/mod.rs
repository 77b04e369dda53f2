//! Distribution functions used for significance tests and intervals.
//!
//! Thin wrappers over `statrs` that validate their arguments up front and turn
//! distribution construction failures into [`LinalgErrors::InvalidParameter`].
use crate::linalg::LinalgErrors;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

fn check_probability(what: &str, p: f64) -> Result<(), LinalgErrors> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(LinalgErrors::InvalidParameter(format!(
            "{}: probability must be in [0, 1], got {}.",
            what, p
        )))
    }
}

fn standard_normal() -> Result<Normal, LinalgErrors> {
    Normal::new(0.0, 1.0).map_err(|e| LinalgErrors::InvalidParameter(format!("Normal: {}", e)))
}

fn students_t(df: f64) -> Result<StudentsT, LinalgErrors> {
    if df.is_nan() || df <= 0.0 {
        return Err(LinalgErrors::InvalidParameter(format!(
            "Student t: degrees of freedom must be positive, got {}.",
            df
        )));
    }
    StudentsT::new(0.0, 1.0, df).map_err(|e| LinalgErrors::InvalidParameter(format!("Student t: {}", e)))
}

fn fisher_snedecor(freedom_1: f64, freedom_2: f64) -> Result<FisherSnedecor, LinalgErrors> {
    if freedom_1.is_nan() || freedom_1 <= 0.0 || freedom_2.is_nan() || freedom_2 <= 0.0 {
        return Err(LinalgErrors::InvalidParameter(format!(
            "F: degrees of freedom must be positive, got ({}, {}).",
            freedom_1, freedom_2
        )));
    }
    FisherSnedecor::new(freedom_1, freedom_2).map_err(|e| LinalgErrors::InvalidParameter(format!("F: {}", e)))
}

/// Survival function P(Z > x) of the standard normal.
pub fn normal_sf(x: f64) -> Result<f64, LinalgErrors> {
    if x.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(standard_normal()?.sf(x))
}

/// Cumulative distribution function P(Z <= x) of the standard normal.
pub fn normal_cdf(x: f64) -> Result<f64, LinalgErrors> {
    if x.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(standard_normal()?.cdf(x))
}

/// Inverse of the standard normal CDF.
pub fn normal_ppf(p: f64) -> Result<f64, LinalgErrors> {
    check_probability("Normal", p)?;
    if p == 0.0 {
        Ok(f64::NEG_INFINITY)
    } else if p == 1.0 {
        Ok(f64::INFINITY)
    } else {
        Ok(standard_normal()?.inverse_cdf(p))
    }
}

/// CDF of the standard Student t distribution with `df` degrees of freedom.
pub fn student_t_cdf(x: f64, df: f64) -> Result<f64, LinalgErrors> {
    let dist = students_t(df)?;
    if x.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(dist.cdf(x))
}

/// Survival function of the standard Student t distribution.
pub fn student_t_sf(x: f64, df: f64) -> Result<f64, LinalgErrors> {
    let dist = students_t(df)?;
    if x.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(dist.sf(x))
}

/// Inverse CDF of the standard Student t distribution.
pub fn student_t_ppf(p: f64, df: f64) -> Result<f64, LinalgErrors> {
    check_probability("Student t", p)?;
    let dist = students_t(df)?;
    if p == 0.0 {
        Ok(f64::NEG_INFINITY)
    } else if p == 1.0 {
        Ok(f64::INFINITY)
    } else {
        Ok(dist.inverse_cdf(p))
    }
}

/// CDF of the F distribution with (`freedom_1`, `freedom_2`) degrees of freedom.
pub fn fisher_snedecor_cdf(x: f64, freedom_1: f64, freedom_2: f64) -> Result<f64, LinalgErrors> {
    let dist = fisher_snedecor(freedom_1, freedom_2)?;
    if x.is_nan() {
        Ok(f64::NAN)
    } else if x <= 0.0 {
        Ok(0.0)
    } else {
        Ok(dist.cdf(x))
    }
}

/// Upper tail P(F > x), the p value of an F test.
pub fn fisher_snedecor_sf(x: f64, freedom_1: f64, freedom_2: f64) -> Result<f64, LinalgErrors> {
    let dist = fisher_snedecor(freedom_1, freedom_2)?;
    if x.is_nan() {
        Ok(f64::NAN)
    } else if x <= 0.0 {
        Ok(1.0)
    } else {
        Ok(dist.sf(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normal_known_values() {
        assert_abs_diff_eq!(normal_cdf(0.0).unwrap(), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(1.959963984540054).unwrap(), 0.975, epsilon = 1e-12);
        assert_abs_diff_eq!(normal_cdf(-1.0).unwrap(), 0.15865525393145707, epsilon = 1e-12);
        assert_abs_diff_eq!(normal_sf(3.0).unwrap(), 0.0013498980316301035, epsilon = 1e-14);
        assert_eq!(normal_sf(f64::INFINITY).unwrap(), 0.0);
        assert_eq!(normal_cdf(f64::INFINITY).unwrap(), 1.0);
        assert_abs_diff_eq!(normal_sf(1e-200).unwrap(), 0.5, epsilon = 1e-15);
        assert!(normal_sf(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn test_normal_ppf() {
        assert_abs_diff_eq!(normal_ppf(0.975).unwrap(), 1.959963984540054, epsilon = 1e-10);
        assert_abs_diff_eq!(normal_ppf(0.5).unwrap(), 0.0, epsilon = 1e-12);
        for p in [1e-6, 0.01, 0.3, 0.8, 0.999] {
            let x = normal_ppf(p).unwrap();
            assert_abs_diff_eq!(normal_cdf(x).unwrap(), p, epsilon = 1e-10);
        }
        assert_eq!(normal_ppf(0.0).unwrap(), f64::NEG_INFINITY);
        assert!(normal_ppf(-0.1).is_err());
    }

    #[test]
    fn test_student_t_known_quantiles() {
        // t_{0.975, 10} = 2.228138851986
        assert_abs_diff_eq!(student_t_cdf(2.228138851986, 10.0).unwrap(), 0.975, epsilon = 1e-9);
        assert_abs_diff_eq!(student_t_sf(-2.228138851986, 10.0).unwrap(), 0.975, epsilon = 1e-9);
        // t with 1 df is Cauchy: cdf(1) = 0.75
        assert_abs_diff_eq!(student_t_cdf(1.0, 1.0).unwrap(), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(student_t_cdf(0.0, 5.0).unwrap(), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_student_t_bounds() {
        for t in [-50.0, -3.0, -0.1, 0.0, 0.1, 3.0, 50.0] {
            let p = student_t_cdf(t, 4.0).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
        assert!(student_t_cdf(1.0, 0.0).is_err());
        assert!(student_t_cdf(1.0, -2.0).is_err());
        assert!(student_t_sf(f64::NAN, 3.0).unwrap().is_nan());
    }

    #[test]
    fn test_student_t_ppf_inverts_cdf() {
        assert_abs_diff_eq!(student_t_ppf(0.975, 10.0).unwrap(), 2.228138851986, epsilon = 1e-6);
        for (p, df) in [(0.9, 3.0), (0.2, 7.5), (0.995, 30.0)] {
            let t = student_t_ppf(p, df).unwrap();
            assert_abs_diff_eq!(student_t_cdf(t, df).unwrap(), p, epsilon = 1e-7);
        }
        assert!(student_t_ppf(1.5, 3.0).is_err());
        assert!(student_t_ppf(0.5, 0.0).is_err());
    }

    #[test]
    fn test_fisher_snedecor_known_quantile() {
        // F_{0.95}(3, 10) = 3.708264819
        assert_abs_diff_eq!(
            fisher_snedecor_cdf(3.708264819, 3.0, 10.0).unwrap(),
            0.95,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            fisher_snedecor_sf(3.708264819, 3.0, 10.0).unwrap(),
            0.05,
            epsilon = 1e-6
        );
        assert_eq!(fisher_snedecor_cdf(0.0, 2.0, 2.0).unwrap(), 0.0);
        assert_eq!(fisher_snedecor_cdf(-1.0, 2.0, 2.0).unwrap(), 0.0);
        // F(2, 2): cdf(x) = x / (1 + x)
        assert_abs_diff_eq!(fisher_snedecor_cdf(3.0, 2.0, 2.0).unwrap(), 0.75, epsilon = 1e-12);
        assert!(fisher_snedecor_cdf(1.0, 0.0, 2.0).is_err());
    }
}
