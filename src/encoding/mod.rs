//! Label encoding
//!
//! Maps arbitrary ordered label values to dense integer codes `0..k-1` and back.
//! Codes follow the sorted order of the distinct labels seen during fit.

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Bidirectional mapping between label values and dense codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder<L> {
    classes: Vec<L>,
}

impl<L> Default for LabelEncoder<L> {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
        }
    }
}

impl<L: Ord + Clone + Debug> LabelEncoder<L> {
    /// Create an unfitted encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder fitted on `labels`
    pub fn fitted(labels: &[L]) -> Result<Self> {
        let mut encoder = Self::new();
        encoder.fit(labels)?;
        Ok(encoder)
    }

    /// Record the sorted set of distinct labels
    pub fn fit(&mut self, labels: &[L]) -> Result<()> {
        if labels.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        self.classes = classes;
        Ok(())
    }

    /// Map each label to its code
    pub fn transform(&self, labels: &[L]) -> Result<Vec<usize>> {
        if !self.is_fitted() {
            return Err(SVMError::UnfittedModel);
        }

        labels.iter().map(|label| self.code_of(label)).collect()
    }

    /// Map each code back to its label
    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<L>> {
        codes
            .iter()
            .map(|&code| {
                self.classes
                    .get(code)
                    .cloned()
                    .ok_or(SVMError::LabelOutOfRange {
                        code,
                        n_classes: self.classes.len(),
                    })
            })
            .collect()
    }

    /// Code of a single label
    pub fn code_of(&self, label: &L) -> Result<usize> {
        self.classes
            .binary_search(label)
            .map_err(|_| SVMError::UnknownLabel(format!("{label:?}")))
    }

    /// Distinct labels in code order
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Number of distinct labels
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Whether `fit` has been called
    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }
}
