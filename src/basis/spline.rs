//! B-spline bases by the Cox-de Boor recursion.
use crate::linalg::LinalgErrors;
use faer::Mat;
use itertools::Itertools;

fn cox_de_boor(x: f64, i: usize, deg: usize, knots: &[f64]) -> f64 {
    if deg == 0 {
        let (lo, hi) = (knots[i], knots[i + 1]);
        let last = knots[knots.len() - 1];
        // Close the final non-empty span on the right so x == ub is covered.
        return if (lo <= x && x < hi) || (x == last && hi == last && lo < hi) {
            1.0
        } else {
            0.0
        };
    }
    let left_den = knots[i + deg] - knots[i];
    let right_den = knots[i + deg + 1] - knots[i + 1];
    let left = if left_den > 0.0 {
        (x - knots[i]) / left_den * cox_de_boor(x, i, deg - 1, knots)
    } else {
        0.0
    };
    let right = if right_den > 0.0 {
        (knots[i + deg + 1] - x) / right_den * cox_de_boor(x, i + 1, deg - 1, knots)
    } else {
        0.0
    };
    left + right
}

/// Basis function `i` of degree `deg` over `knots`, evaluated at `x`.
/// Needs `i + deg + 1 < knots.len()` and non-decreasing knots.
pub fn bspline(x: f64, i: usize, deg: usize, knots: &[f64]) -> Result<f64, LinalgErrors> {
    if i + deg + 1 >= knots.len() {
        return Err(LinalgErrors::InvalidBasisConfiguration(format!(
            "basis function {} of degree {} needs more than {} knots",
            i,
            deg,
            knots.len()
        )));
    }
    if knots.iter().tuple_windows().any(|(a, b)| !(a <= b)) {
        return Err(LinalgErrors::InvalidBasisConfiguration(
            "knots must be non-decreasing".into(),
        ));
    }
    Ok(cox_de_boor(x, i, deg, knots))
}

/// Boundary knots repeated `degree + 1` times around the sorted interior knots.
pub fn full_knots(degree: usize, int_knots: &[f64], lb: f64, ub: f64) -> Result<Vec<f64>, LinalgErrors> {
    if !(lb.is_finite() && ub.is_finite() && lb < ub) {
        return Err(LinalgErrors::InvalidBasisConfiguration(format!(
            "spline bounds must be finite with lb < ub, got [{}, {}]",
            lb, ub
        )));
    }
    if let Some(k) = int_knots.iter().find(|k| !(lb <= **k && **k <= ub)) {
        return Err(LinalgErrors::InvalidBasisConfiguration(format!(
            "interior knot {} lies outside [{}, {}]",
            k, lb, ub
        )));
    }
    let mut sorted = int_knots.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut knots = vec![lb; degree + 1];
    knots.extend(sorted);
    knots.extend(std::iter::repeat(ub).take(degree + 1));
    Ok(knots)
}

/// B-spline design matrix with `int_knots.len() + degree + 1` columns, or one
/// fewer when `intercept` is false. Points outside [lb, ub] get a zero row.
pub fn bs(
    x: &[f64],
    degree: usize,
    intercept: bool,
    int_knots: &[f64],
    lb: f64,
    ub: f64,
) -> Result<Mat<f64>, LinalgErrors> {
    let knots = full_knots(degree, int_knots, lb, ub)?;
    let n_basis = knots.len() - degree - 1;
    let skip = (!intercept) as usize;
    if n_basis <= skip {
        return Err(LinalgErrors::InvalidBasisConfiguration(
            "spline basis would have no columns".into(),
        ));
    }
    let outside = x.iter().filter(|v| !(lb <= **v && **v <= ub)).count();
    if outside > 0 {
        log::debug!(
            "{} of {} points lie outside the spline bounds [{}, {}] and get a zero row",
            outside,
            x.len(),
            lb,
            ub
        );
    }
    Ok(Mat::from_fn(x.len(), n_basis - skip, |r, c| {
        cox_de_boor(x[r], c + skip, degree, &knots)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_partition_of_unity() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut x: Vec<f64> = (0..50).map(|_| rng.gen_range(0.0..10.0)).collect();
        x.push(0.0);
        x.push(10.0);
        for degree in 0..4 {
            let m = bs(&x, degree, true, &[7.5, 2.0, 5.0], 0.0, 10.0).unwrap();
            assert_eq!(m.ncols(), 3 + degree + 1);
            for i in 0..x.len() {
                let s: f64 = (0..m.ncols()).map(|j| m[(i, j)]).sum();
                assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
                assert!((0..m.ncols()).all(|j| m[(i, j)] >= 0.0));
            }
        }
    }

    #[test]
    fn test_linear_spline_is_hat_function() {
        let knots = full_knots(1, &[1.0], 0.0, 2.0).unwrap();
        assert_eq!(knots, vec![0.0, 0.0, 1.0, 2.0, 2.0]);
        assert_abs_diff_eq!(bspline(0.5, 1, 1, &knots).unwrap(), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(bspline(1.0, 1, 1, &knots).unwrap(), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(bspline(1.5, 1, 1, &knots).unwrap(), 0.5, epsilon = 1e-15);
        assert!(bspline(0.5, 3, 1, &knots).is_err());
        assert!(bspline(0.5, 0, 1, &[0.0, 2.0, 1.0]).is_err());
    }

    #[test]
    fn test_intercept_drops_first_column() {
        let x = [0.1, 0.4, 0.9];
        let with = bs(&x, 3, true, &[0.5], 0.0, 1.0).unwrap();
        let without = bs(&x, 3, false, &[0.5], 0.0, 1.0).unwrap();
        assert_eq!(with.ncols(), 5);
        assert_eq!(without.ncols(), 4);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(without[(i, j)], with[(i, j + 1)]);
            }
        }
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(bs(&[0.5], 3, true, &[1.5], 0.0, 1.0).is_err());
        assert!(bs(&[0.5], 3, true, &[], 1.0, 1.0).is_err());
        assert!(bs(&[0.5], 3, true, &[f64::NAN], 0.0, 1.0).is_err());
        assert!(bs(&[0.5], 0, false, &[], 0.0, 1.0).is_err());

        let m = bs(&[-1.0, 2.0], 2, true, &[0.5], 0.0, 1.0).unwrap();
        for j in 0..m.ncols() {
            assert_eq!(m[(0, j)], 0.0);
            assert_eq!(m[(1, j)], 0.0);
        }
    }
}
