//! High-level text classification API
//!
//! [`TextClassifier`] ties together a text model, a label encoder and a linear
//! SVM. It can be fitted on feature vectors, on raw text through its text
//! model, or directly on a JSON-lines record file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use textsvc::api::TextClassifier;
//! use textsvc::data::{RecordOptions, RecordReader};
//! use textsvc::text::TfIdfModel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RecordOptions::default();
//! let records = RecordReader::new(options.clone()).read_labeled("train.json")?;
//! let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
//! let model = Arc::new(TfIdfModel::with_defaults(&texts)?);
//!
//! let mut classifier: TextClassifier = TextClassifier::new(model).with_c(1.0);
//! classifier.fit_file("train.json", &options)?;
//! println!("{}", classifier.predict_text("what a lovely day")?);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    FeatureVector, Label, Loss, OptimizerConfig, Result, SVMError, TextModel,
};
use crate::data::{RecordOptions, RecordReader};
use crate::encoding::LabelEncoder;
use crate::matrix::FeatureMatrix;
use crate::optimizer::{LinearSvc, TrainedLinearSvc};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

/// Everything `fit` produces; replaced as a unit
#[derive(Clone)]
struct Fitted<L> {
    num_terms: usize,
    encoder: LabelEncoder<L>,
    svc: TrainedLinearSvc,
}

/// Linear SVM text classifier with builder-style configuration
#[derive(Clone)]
pub struct TextClassifier<L = Label> {
    config: OptimizerConfig,
    text_model: Option<Arc<dyn TextModel>>,
    fitted: Option<Fitted<L>>,
}

impl<L: Ord + Clone + Debug> TextClassifier<L> {
    /// Create a classifier that vectorizes text with `text_model`
    pub fn new(text_model: Arc<dyn TextModel>) -> Self {
        Self {
            config: OptimizerConfig::default(),
            text_model: Some(text_model),
            fitted: None,
        }
    }

    /// Create a classifier that only works on feature vectors
    pub fn without_text_model() -> Self {
        Self {
            config: OptimizerConfig::default(),
            text_model: None,
            fitted: None,
        }
    }

    /// Replace the whole optimizer configuration
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set maximum number of solver iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the loss function
    pub fn with_loss(mut self, loss: Loss) -> Self {
        self.config.loss = loss;
        self
    }

    /// Set the solver seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Fit on feature vectors and their labels.
    ///
    /// The term space width is taken from `x`. On error the previous fit, if
    /// any, is kept.
    pub fn fit(&mut self, x: &[FeatureVector], y: &[L]) -> Result<&mut Self> {
        if x.len() != y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }

        let encoder = LabelEncoder::fitted(y)?;
        let codes = encoder.transform(y)?;
        let matrix = FeatureMatrix::from_vectors(x, None)?;
        let svc = LinearSvc::new(self.config.clone()).train(&matrix, &codes, encoder.n_classes())?;

        self.fitted = Some(Fitted {
            num_terms: matrix.n_cols(),
            encoder,
            svc,
        });
        Ok(self)
    }

    /// Predict labels for feature vectors.
    ///
    /// Term-ids at or beyond the fitted width are ignored.
    pub fn predict(&self, x: &[FeatureVector]) -> Result<Vec<L>> {
        let fitted = self.fitted()?;
        let matrix = FeatureMatrix::from_vectors(x, Some(fitted.num_terms))?;
        let codes = fitted.svc.predict(&matrix)?;
        fitted.encoder.inverse_transform(&codes)
    }

    /// Raw SVM scores: one column for two classes, one per class otherwise
    pub fn decision_function(&self, x: &[FeatureVector]) -> Result<Vec<Vec<f64>>> {
        let fitted = self.fitted()?;
        let matrix = FeatureMatrix::from_vectors(x, Some(fitted.num_terms))?;
        fitted.svc.decision_function(&matrix)
    }

    /// Predict the label of one text using the attached text model
    pub fn predict_text(&self, text: &str) -> Result<L> {
        let model = self.text_model.as_ref().ok_or(SVMError::MissingTextModel)?;
        let vector = model.vectorize(text);
        self.predict(std::slice::from_ref(&vector))?
            .pop()
            .ok_or(SVMError::EmptyDataset)
    }

    /// Compare predictions for `x` against `y`
    pub fn evaluate(&self, x: &[FeatureVector], y: &[L]) -> Result<EvaluationMetrics<L>> {
        let predicted = self.predict(x)?;
        EvaluationMetrics::from_predictions(y, &predicted)
    }

    fn fitted(&self) -> Result<&Fitted<L>> {
        self.fitted.as_ref().ok_or(SVMError::UnfittedModel)
    }

    /// Whether `fit` has succeeded at least once
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Width of the fitted term space
    pub fn num_terms(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.num_terms)
    }

    /// Labels known to the fitted model, in code order
    pub fn classes(&self) -> Option<&[L]> {
        self.fitted.as_ref().map(|f| f.encoder.classes())
    }

    /// The attached text model
    pub fn text_model(&self) -> Option<&Arc<dyn TextModel>> {
        self.text_model.as_ref()
    }

    /// Optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// The trained SVM
    pub fn svc(&self) -> Option<&TrainedLinearSvc> {
        self.fitted.as_ref().map(|f| &f.svc)
    }

    /// The fitted label encoder
    pub fn encoder(&self) -> Option<&LabelEncoder<L>> {
        self.fitted.as_ref().map(|f| &f.encoder)
    }

    /// Rebuild a fitted classifier from saved parts
    pub(crate) fn from_parts(
        config: OptimizerConfig,
        text_model: Option<Arc<dyn TextModel>>,
        num_terms: usize,
        encoder: LabelEncoder<L>,
        svc: TrainedLinearSvc,
    ) -> Result<Self> {
        if svc.n_features() != num_terms {
            return Err(SVMError::DimensionMismatch {
                expected: num_terms,
                actual: svc.n_features(),
            });
        }
        if svc.n_classes() != encoder.n_classes() {
            return Err(SVMError::InvalidParameter(format!(
                "model has {} classes but the label encoding has {}",
                svc.n_classes(),
                encoder.n_classes()
            )));
        }

        Ok(Self {
            config,
            text_model,
            fitted: Some(Fitted {
                num_terms,
                encoder,
                svc,
            }),
        })
    }
}

impl TextClassifier<Label> {
    /// Fit on a labeled record file, vectorizing each text with the text model
    pub fn fit_file<P: AsRef<Path>>(&mut self, path: P, options: &RecordOptions) -> Result<&mut Self> {
        let model = Arc::clone(self.text_model.as_ref().ok_or(SVMError::MissingTextModel)?);
        let records = RecordReader::new(options.clone()).read_labeled(path)?;

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let x = model.vectorize_batch(&texts);
        let y: Vec<Label> = records.into_iter().map(|r| r.label).collect();
        self.fit(&x, &y)
    }

    /// Predict a label for every record of a file, in file order
    pub fn predict_file<P: AsRef<Path>>(&self, path: P, options: &RecordOptions) -> Result<Vec<Label>> {
        let texts = RecordReader::new(options.clone()).read_texts(path)?;
        texts.iter().map(|text| self.predict_text(text)).collect()
    }

    /// Evaluate on a labeled record file
    pub fn evaluate_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: &RecordOptions,
    ) -> Result<EvaluationMetrics<Label>> {
        let records = RecordReader::new(options.clone()).read_labeled(path)?;
        let predicted = records
            .iter()
            .map(|r| self.predict_text(&r.text))
            .collect::<Result<Vec<_>>>()?;
        let actual: Vec<Label> = records.into_iter().map(|r| r.label).collect();
        EvaluationMetrics::from_predictions(&actual, &predicted)
    }
}

/// Multi-class evaluation metrics built from a confusion matrix
#[derive(Debug, Clone)]
pub struct EvaluationMetrics<L> {
    classes: Vec<L>,
    /// `confusion[actual][predicted]`
    confusion: Vec<Vec<usize>>,
}

/// Precision, recall and F1 of one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics<L> {
    pub label: L,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl<L: Ord + Clone + Debug> EvaluationMetrics<L> {
    /// Tally `actual` against `predicted`
    pub fn from_predictions(actual: &[L], predicted: &[L]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(SVMError::DimensionMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }

        let mut classes: Vec<L> = actual.iter().chain(predicted).cloned().collect();
        classes.sort();
        classes.dedup();

        let index = |label: &L| classes.binary_search(label).unwrap_or(0);
        let mut confusion = vec![vec![0; classes.len()]; classes.len()];
        for (a, p) in actual.iter().zip(predicted) {
            confusion[index(a)][index(p)] += 1;
        }

        Ok(Self { classes, confusion })
    }

    /// Number of evaluated samples
    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    /// Fraction of correct predictions
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            let correct: usize = (0..self.classes.len()).map(|i| self.confusion[i][i]).sum();
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall and F1
    pub fn per_class(&self) -> Vec<ClassMetrics<L>> {
        let n = self.classes.len();
        (0..n)
            .map(|i| {
                let tp = self.confusion[i][i];
                let predicted: usize = (0..n).map(|a| self.confusion[a][i]).sum();
                let support: usize = self.confusion[i].iter().sum();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };

                ClassMetrics {
                    label: self.classes[i].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Unweighted mean of the per-class F1 scores
    pub fn macro_f1(&self) -> f64 {
        let per_class = self.per_class();
        if per_class.is_empty() {
            0.0
        } else {
            per_class.iter().map(|m| m.f1).sum::<f64>() / per_class.len() as f64
        }
    }

    /// Classes appearing in either the actual or the predicted labels
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Confusion counts indexed `[actual][predicted]`
    pub fn confusion(&self) -> &[Vec<usize>] {
        &self.confusion
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
