//! Fits one model per response column in parallel. Fits share only the design
//! and the read-only options; each owns its factorization and buffers.
use super::{
    design::DesignMatrix,
    glm::{Glm, GlmFamily, GlmOptions},
    lr::{Lm, LmOptions},
    LinalgErrors,
};
use rayon::prelude::{IntoParallelRefIterator, IndexedParallelIterator, ParallelIterator};

/// Results come back in the order of `responses`.
pub fn fit_lm_many(
    responses: &[Vec<f64>],
    x: &DesignMatrix,
    options: &LmOptions,
) -> Vec<Result<Lm, LinalgErrors>> {
    responses
        .par_iter()
        .map(|y| Lm::fit(y, x, options))
        .collect()
}

/// Results come back in the order of `responses`.
pub fn fit_glm_many(
    responses: &[Vec<f64>],
    x: &DesignMatrix,
    family: &GlmFamily,
    options: &GlmOptions,
) -> Vec<Result<Glm, LinalgErrors>> {
    responses
        .par_iter()
        .enumerate()
        .map(|(i, y)| {
            let out = Glm::fit(y, x, family.clone(), options);
            if let Err(e) = &out {
                log::debug!("Batch GLM fit {} failed: {}", i, e);
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::LinearModel;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_batch_matches_sequential() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let x = DesignMatrix::from_columns(vec![("x", (0..20).map(|i| i as f64).collect())]).unwrap();
        let responses: Vec<Vec<f64>> = (0..8)
            .map(|k| (0..20).map(|i| k as f64 + 0.3 * i as f64 + rng.gen_range(-1.0..1.0)).collect())
            .collect();
        let batch = fit_lm_many(&responses, &x, &LmOptions::default());
        assert_eq!(batch.len(), 8);
        for (y, fit) in responses.iter().zip(batch.iter()) {
            let single = Lm::fit(y, &x, &LmOptions::default()).unwrap();
            let fit = fit.as_ref().unwrap();
            for (a, b) in fit.coefficients().iter().zip(single.coefficients()) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_batch_glm_keeps_failures_in_place() {
        let x = DesignMatrix::from_columns(vec![("x", (1..=9).map(|i| i as f64).collect())]).unwrap();
        let good = vec![2.0, 3.0, 6.0, 7.0, 8.0, 9.0, 10.0, 12.0, 15.0];
        let short = vec![1.0, 2.0];
        let out = fit_glm_many(&[good, short], &x, &GlmFamily::Poisson, &GlmOptions::default());
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(LinalgErrors::DimensionMismatch(_))));
    }
}
