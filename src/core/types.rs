//! Core type definitions for text classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

/// A text turned into weighted term-ids by a [`TextModel`](crate::core::TextModel)
pub type FeatureVector = SparseVector;

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        Self::from_pairs(indices.into_iter().zip(values))
    }

    /// Build a vector from `(term_id, weight)` pairs in any order.
    ///
    /// Repeated term-ids are summed, the way a bag of words counts them.
    pub fn from_pairs<I: IntoIterator<Item = (usize, f64)>>(pairs: I) -> Self {
        let mut pairs: Vec<(usize, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            if indices.last() == Some(&idx) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                indices.push(idx);
                values.push(value);
            }
        }

        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Largest index with a stored value
    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Copy of this vector without the entries at or beyond `width`
    pub fn truncated(&self, width: usize) -> Self {
        let keep = self.indices.partition_point(|&idx| idx < width);
        Self {
            indices: self.indices[..keep].to_vec(),
            values: self.values[..keep].to_vec(),
        }
    }

    /// Iterate over `(index, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Scale to unit L2 norm; the zero vector is left alone
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Class label as read from a record file.
///
/// Integers sort before strings; within a kind the natural order applies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(value) => write!(f, "{value}"),
            Label::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Int(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Text(value)
    }
}

/// A text together with its class label
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledRecord<L = Label> {
    pub text: String,
    pub label: L,
}

impl<L> LabeledRecord<L> {
    /// Create a new record
    pub fn new(text: impl Into<String>, label: L) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Loss minimised by the linear SVM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// max(0, 1 - y w.x)
    Hinge,
    /// max(0, 1 - y w.x)^2
    #[default]
    SquaredHinge,
}

/// Result of one binary optimization
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Primal weights, one per feature column
    pub weights: Vec<f64>,
    /// Intercept (weight of the constant bias feature times its value)
    pub bias: f64,
    /// Dual variables, one per training row
    pub alpha: Vec<f64>,
    /// Number of outer iterations performed
    pub iterations: usize,
    /// Whether the projected gradient reached the tolerance
    pub converged: bool,
}

/// Configuration for the linear SVM optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Regularization parameter
    pub c: f64,
    /// Stopping tolerance on the projected gradient spread
    pub epsilon: f64,
    /// Maximum number of outer iterations
    pub max_iterations: usize,
    /// Loss function
    pub loss: Loss,
    /// Enable shrinking heuristic
    pub shrinking: bool,
    /// Value of the constant feature used to learn the intercept (0 disables it)
    pub bias: f64,
    /// Seed for the coordinate permutation
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 1e-4,
            max_iterations: 1000,
            loss: Loss::SquaredHinge,
            shrinking: true,
            bias: 1.0,
            seed: 0,
        }
    }
}
