//! Core traits for text classification

use crate::core::FeatureVector;

/// Turns raw text into a sparse feature vector
pub trait TextModel: Send + Sync {
    /// Vectorize a single text
    fn vectorize(&self, text: &str) -> FeatureVector;

    /// Vectorize several texts, preserving order
    fn vectorize_batch(&self, texts: &[&str]) -> Vec<FeatureVector> {
        texts.iter().map(|t| self.vectorize(t)).collect()
    }

    /// Size of the term space this model produces ids in
    fn num_terms(&self) -> usize;
}

/// Progress reporting for long-running loops such as k-fold evaluation
pub trait Progress {
    /// Called once before the first step
    fn start(&mut self, _total: usize) {}

    /// Called after each completed step
    fn advance(&mut self) {}

    /// Called once after the last step
    fn finish(&mut self) {}
}

/// Progress sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
