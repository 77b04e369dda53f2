//! Principal component analysis by thin SVD of the centered data.
use crate::linalg::LinalgErrors;
use crate::linear::DesignMatrix;
use faer::{Mat, MatRef};
use itertools::Itertools;

/// A fitted PCA with `k = min(n, p)` components.
#[derive(Debug, Clone)]
pub struct Pca {
    names: Vec<String>,
    x_bar: Vec<f64>,
    loadings: Mat<f64>,
    scores: Mat<f64>,
    singular_values: Vec<f64>,
    sdev: Vec<f64>,
    variance: Vec<f64>,
    total_variance: f64,
    prop_var: Vec<f64>,
    cum_var: Vec<f64>,
}

impl Pca {
    pub fn fit(x: &DesignMatrix) -> Result<Self, LinalgErrors> {
        let data = x.as_ref();
        let n = data.nrows();
        let p = data.ncols();
        if n <= 1 {
            return Err(LinalgErrors::InsufficientObservations(n));
        }
        if p == 0 {
            return Err(LinalgErrors::InvalidParameter("PCA needs at least one column".into()));
        }
        if (0..p).any(|j| data.col(j).iter().any(|v| !v.is_finite())) {
            return Err(LinalgErrors::NumericDegeneracy(
                "PCA input contains non-finite values".into(),
            ));
        }

        let x_bar = (0..p)
            .map(|j| data.col(j).iter().sum::<f64>() / n as f64)
            .collect_vec();
        let centered = Mat::from_fn(n, p, |i, j| data[(i, j)] - x_bar[j]);

        let svd = centered
            .as_ref()
            .thin_svd()
            .map_err(|e| LinalgErrors::NumericDegeneracy(format!("SVD failed: {:?}", e)))?;
        let singular_values = svd.S().column_vector().iter().copied().collect_vec();
        let mut loadings = svd.V().to_owned();

        // Make the largest-magnitude entry of each loading positive.
        for j in 0..loadings.ncols() {
            let pivot = (0..p)
                .map(|i| loadings[(i, j)])
                .fold(0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                for i in 0..p {
                    loadings[(i, j)] = -loadings[(i, j)];
                }
            }
        }

        let scores = centered.as_ref() * loadings.as_ref();
        let sdev = singular_values
            .iter()
            .map(|s| s / ((n - 1) as f64).sqrt())
            .collect_vec();
        let variance = sdev.iter().map(|s| s * s).collect_vec();
        let total_variance: f64 = variance.iter().sum();
        let prop_var = variance.iter().map(|v| v / total_variance).collect_vec();
        let cum_var = prop_var
            .iter()
            .scan(0f64, |acc, v| {
                *acc += v;
                Some(*acc)
            })
            .collect_vec();

        log::debug!(
            "PCA on {} x {}: leading component explains {:.4} of the variance",
            n,
            p,
            prop_var.first().copied().unwrap_or(f64::NAN)
        );

        Ok(Pca {
            names: x.names().to_vec(),
            x_bar,
            loadings,
            scores,
            singular_values,
            sdev,
            variance,
            total_variance,
            prop_var,
            cum_var,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_components(&self) -> usize {
        self.loadings.ncols()
    }

    /// Column means used for centering.
    pub fn x_bar(&self) -> &[f64] {
        &self.x_bar
    }

    /// p x k, one principal direction per column.
    pub fn loadings(&self) -> MatRef<'_, f64> {
        self.loadings.as_ref()
    }

    /// n x k coordinates of the observations, U S.
    pub fn scores(&self) -> MatRef<'_, f64> {
        self.scores.as_ref()
    }

    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    pub fn sdev(&self) -> &[f64] {
        &self.sdev
    }

    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    pub fn total_variance(&self) -> f64 {
        self.total_variance
    }

    pub fn proportion_of_variance(&self) -> &[f64] {
        &self.prop_var
    }

    pub fn cumulative_proportion(&self) -> &[f64] {
        &self.cum_var
    }

    /// Scores of new observations in the fitted component space.
    pub fn project(&self, new: MatRef<'_, f64>) -> Result<Mat<f64>, LinalgErrors> {
        if new.ncols() != self.x_bar.len() {
            return Err(LinalgErrors::DimensionMismatch(format!(
                "PCA was fit on {} columns, got {}",
                self.x_bar.len(),
                new.ncols()
            )));
        }
        let centered = Mat::from_fn(new.nrows(), new.ncols(), |i, j| new[(i, j)] - self.x_bar[j]);
        Ok(centered.as_ref() * self.loadings.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    fn sample(n: usize, seed: u64) -> DesignMatrix {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut data = Mat::<f64>::zeros(n, 3);
        for i in 0..n {
            let a = normal.sample(&mut rng);
            let b = normal.sample(&mut rng);
            data[(i, 0)] = 3.0 * a + 10.0;
            data[(i, 1)] = a + 0.5 * b - 2.0;
            data[(i, 2)] = 0.2 * normal.sample(&mut rng);
        }
        DesignMatrix::from_mat(data)
    }

    #[test]
    fn test_loadings_orthonormal_and_reconstruction() {
        let d = sample(50, 1);
        let pca = Pca::fit(&d).unwrap();
        assert_eq!(pca.n_components(), 3);

        let vtv = pca.loadings().transpose() * pca.loadings();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(vtv[(i, j)], expected, epsilon = 1e-10);
            }
        }

        let rebuilt = pca.scores() * pca.loadings().transpose();
        for i in 0..50 {
            for j in 0..3 {
                assert_abs_diff_eq!(rebuilt[(i, j)] + pca.x_bar()[j], d.as_ref()[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_variance_bookkeeping() {
        let d = sample(40, 2);
        let pca = Pca::fit(&d).unwrap();
        // Total variance equals the sum of column sample variances.
        let col_var: f64 = (0..3)
            .map(|j| {
                let m = pca.x_bar()[j];
                (0..40).map(|i| (d.as_ref()[(i, j)] - m).powi(2)).sum::<f64>() / 39.0
            })
            .sum();
        assert_abs_diff_eq!(pca.total_variance(), col_var, epsilon = 1e-9);
        assert!(pca.variance().windows(2).all(|w| w[0] >= w[1]));
        assert_abs_diff_eq!(pca.cumulative_proportion()[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pca.proportion_of_variance().iter().sum::<f64>(), 1.0, epsilon = 1e-12);

        // Score columns have variance sdev^2.
        let s0 = pca.scores().col(0).iter().map(|v| v * v).sum::<f64>() / 39.0;
        assert_abs_diff_eq!(s0, pca.variance()[0], epsilon = 1e-9);
    }

    #[test]
    fn test_projection_matches_scores() {
        let d = sample(20, 3);
        let pca = Pca::fit(&d).unwrap();
        let projected = pca.project(d.as_ref()).unwrap();
        for i in 0..20 {
            for j in 0..3 {
                assert_abs_diff_eq!(projected[(i, j)], pca.scores()[(i, j)], epsilon = 1e-10);
            }
        }
        for j in 0..3 {
            let col = pca.loadings().col(j);
            let biggest = col.iter().fold(0f64, |b, v| if v.abs() > b.abs() { *v } else { b });
            assert!(biggest > 0.0);
        }
        assert!(pca.project(Mat::<f64>::zeros(2, 2).as_ref()).is_err());
    }

    #[test]
    fn test_wide_and_tiny_inputs() {
        let wide = DesignMatrix::from_mat(Mat::from_fn(2, 4, |i, j| (i * 3 + j * j) as f64));
        let pca = Pca::fit(&wide).unwrap();
        assert_eq!(pca.n_components(), 2);

        let one = DesignMatrix::from_mat(Mat::from_fn(1, 3, |_, j| j as f64));
        assert_eq!(Pca::fit(&one).unwrap_err(), LinalgErrors::InsufficientObservations(1));
    }
}
