//! Dual coordinate descent for linear SVMs
//!
//! Solves the dual of the L2-regularized hinge or squared hinge loss SVM
//! one variable at a time while keeping the primal weights `w = Σ αᵢ yᵢ xᵢ`
//! up to date, so each step costs O(nnz(xᵢ)). Variables stuck at a bound are
//! shrunk out of the active set and restored before the final convergence check.

use crate::core::{Loss, OptimizationResult, OptimizerConfig, Result, SVMError};
use crate::matrix::FeatureMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Binary linear SVM solver
pub struct DualCoordinateSolver {
    config: OptimizerConfig,
}

impl DualCoordinateSolver {
    /// Create a new solver with the given configuration
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Solve the problem for rows of `x` labelled -1 or +1 in `y`
    pub fn solve(&self, x: &FeatureMatrix, y: &[f64]) -> Result<OptimizationResult> {
        if x.n_rows() == 0 {
            return Err(SVMError::EmptyDataset);
        }
        if x.n_rows() != y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: x.n_rows(),
                actual: y.len(),
            });
        }
        if let Some(&bad) = y.iter().find(|&&label| label != 1.0 && label != -1.0) {
            return Err(SVMError::InvalidDataset(format!(
                "binary labels must be -1 or +1, got {bad}"
            )));
        }
        if !(self.config.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive, got {}",
                self.config.c
            )));
        }

        let n = x.n_rows();
        let n_cols = x.n_cols();
        let bias = self.config.bias.max(0.0);
        let has_bias = bias > 0.0;
        let mut w = vec![0.0; n_cols + usize::from(has_bias)];

        // Squared hinge moves the loss into the diagonal and lifts the upper bound
        let (diag, upper) = match self.config.loss {
            Loss::Hinge => (0.0, self.config.c),
            Loss::SquaredHinge => (0.5 / self.config.c, f64::INFINITY),
        };

        let qd: Vec<f64> = (0..n)
            .map(|i| diag + x.row_norm_squared(i) + bias * bias)
            .collect();

        let mut alpha = vec![0.0; n];
        let mut index: Vec<usize> = (0..n).collect();
        let mut active_size = n;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut pg_max_old = f64::INFINITY;
        let mut pg_min_old = f64::NEG_INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            let mut pg_max_new = f64::NEG_INFINITY;
            let mut pg_min_new = f64::INFINITY;

            index[..active_size].shuffle(&mut rng);

            let mut s = 0;
            while s < active_size {
                let i = index[s];
                let y_i = y[i];
                let mut margin = x.row_dot(i, &w);
                if has_bias {
                    margin += w[n_cols] * bias;
                }
                let g = y_i * margin - 1.0 + alpha[i] * diag;

                let mut pg = 0.0;
                if alpha[i] == 0.0 {
                    if self.config.shrinking && g > pg_max_old {
                        active_size -= 1;
                        index.swap(s, active_size);
                        continue;
                    } else if g < 0.0 {
                        pg = g;
                    }
                } else if alpha[i] == upper {
                    if self.config.shrinking && g < pg_min_old {
                        active_size -= 1;
                        index.swap(s, active_size);
                        continue;
                    } else if g > 0.0 {
                        pg = g;
                    }
                } else {
                    pg = g;
                }

                pg_max_new = pg_max_new.max(pg);
                pg_min_new = pg_min_new.min(pg);

                if pg.abs() > 1e-12 && qd[i] > 0.0 {
                    let alpha_old = alpha[i];
                    alpha[i] = (alpha[i] - g / qd[i]).max(0.0).min(upper);
                    let delta = (alpha[i] - alpha_old) * y_i;

                    let (indices, values) = x.row(i);
                    for (&idx, &value) in indices.iter().zip(values) {
                        w[idx] += delta * value;
                    }
                    if has_bias {
                        w[n_cols] += delta * bias;
                    }
                }

                s += 1;
            }

            iterations += 1;

            if pg_max_new - pg_min_new <= self.config.epsilon {
                if active_size == n {
                    converged = true;
                    break;
                }
                // Re-check every variable before declaring convergence
                active_size = n;
                pg_max_old = f64::INFINITY;
                pg_min_old = f64::NEG_INFINITY;
                continue;
            }

            pg_max_old = if pg_max_new <= 0.0 {
                f64::INFINITY
            } else {
                pg_max_new
            };
            pg_min_old = if pg_min_new >= 0.0 {
                f64::NEG_INFINITY
            } else {
                pg_min_new
            };
        }

        let intercept = if has_bias { w.pop().unwrap_or(0.0) * bias } else { 0.0 };

        Ok(OptimizationResult {
            weights: w,
            bias: intercept,
            alpha,
            iterations,
            converged,
        })
    }
}
