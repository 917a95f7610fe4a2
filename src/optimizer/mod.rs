//! Multi-class linear SVM training
//!
//! This module turns the binary solver into a multi-class classifier over
//! dense label codes using the one-vs-rest scheme.

use crate::core::{OptimizerConfig, Result, SVMError};
use crate::matrix::FeatureMatrix;
use crate::solver::DualCoordinateSolver;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Linear SVM trainer
#[derive(Debug, Clone, Default)]
pub struct LinearSvc {
    config: OptimizerConfig,
}

impl LinearSvc {
    /// Create a new trainer with the given configuration
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Train on a feature matrix and label codes in `0..n_classes`.
    ///
    /// Two classes train a single problem whose positive class is code 1;
    /// more classes train one problem per class against the rest.
    pub fn train(
        &self,
        x: &FeatureMatrix,
        codes: &[usize],
        n_classes: usize,
    ) -> Result<TrainedLinearSvc> {
        if codes.len() != x.n_rows() {
            return Err(SVMError::DimensionMismatch {
                expected: x.n_rows(),
                actual: codes.len(),
            });
        }
        if n_classes < 2 {
            return Err(SVMError::InvalidDataset(format!(
                "at least two classes are needed to train, got {n_classes}"
            )));
        }
        if let Some(&code) = codes.iter().find(|&&code| code >= n_classes) {
            return Err(SVMError::LabelOutOfRange { code, n_classes });
        }

        let positives: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };

        let solver = DualCoordinateSolver::new(self.config.clone());
        let mut weights = Vec::with_capacity(positives.len());
        let mut biases = Vec::with_capacity(positives.len());

        for positive in positives {
            let y: Vec<f64> = codes
                .iter()
                .map(|&code| if code == positive { 1.0 } else { -1.0 })
                .collect();
            let result = solver.solve(x, &y)?;

            if !result.converged {
                warn!(
                    "Solver for class {positive} did not converge within {} iterations",
                    self.config.max_iterations
                );
            }
            debug!(
                "Class {positive}: {} iterations, bias {:.6}",
                result.iterations, result.bias
            );

            weights.push(result.weights);
            biases.push(result.bias);
        }

        Ok(TrainedLinearSvc {
            n_features: x.n_cols(),
            n_classes,
            weights,
            biases,
        })
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}

/// A trained linear SVM: one weight vector and intercept per binary problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLinearSvc {
    n_features: usize,
    n_classes: usize,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl TrainedLinearSvc {
    /// Raw scores for each row, one per binary problem
    pub fn decision_function(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        if x.n_cols() != self.n_features {
            return Err(SVMError::DimensionMismatch {
                expected: self.n_features,
                actual: x.n_cols(),
            });
        }

        Ok((0..x.n_rows())
            .map(|i| {
                self.weights
                    .iter()
                    .zip(&self.biases)
                    .map(|(w, b)| x.row_dot(i, w) + b)
                    .collect()
            })
            .collect())
    }

    /// Predicted label code for each row
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<usize>> {
        let scores = self.decision_function(x)?;
        Ok(scores.iter().map(|row| self.code_for(row)).collect())
    }

    fn code_for(&self, scores: &[f64]) -> usize {
        if self.n_classes == 2 {
            return usize::from(scores[0] > 0.0);
        }

        let mut best = 0;
        for (code, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = code;
            }
        }
        best
    }

    /// Width of the feature space the model was trained on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Weight vectors, one per binary problem
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Intercepts, one per binary problem
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }
}
