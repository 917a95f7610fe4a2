//! TF-IDF text model

use crate::core::{FeatureVector, Result, SVMError, TextModel};
use crate::text::{normalize, tokenize, TextModelConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Vocabulary and document frequencies learned from a corpus.
///
/// Term-ids are assigned in first-seen order over the training texts. Tokens
/// outside the vocabulary are ignored when vectorizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfModel {
    config: TextModelConfig,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl TfIdfModel {
    /// Learn a model from `texts`
    pub fn fit<S: AsRef<str>>(texts: &[S], config: &TextModelConfig) -> Result<Self> {
        config.validate()?;
        if texts.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for text in texts {
            let tokens = Self::tokens_with(text.as_ref(), config);
            let mut seen: HashSet<usize> = HashSet::new();
            for token in tokens {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token).or_insert(next_id);
                if id == document_frequency.len() {
                    document_frequency.push(0);
                }
                if seen.insert(id) {
                    document_frequency[id] += 1;
                }
            }
        }

        let n_documents = texts.len();
        let idf = document_frequency
            .iter()
            .map(|&df| (n_documents as f64 / df as f64).log2())
            .collect();

        Ok(Self {
            config: config.clone(),
            vocabulary,
            idf,
            n_documents,
        })
    }

    /// Learn a model with the default configuration
    pub fn with_defaults<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        Self::fit(texts, &TextModelConfig::default())
    }

    fn tokens_with(text: &str, config: &TextModelConfig) -> Vec<String> {
        tokenize(&normalize(text, config), &config.token_list)
    }

    /// Tokens this model extracts from `text`
    pub fn tokens(&self, text: &str) -> Vec<String> {
        Self::tokens_with(text, &self.config)
    }

    /// Id of a token, if it is in the vocabulary
    pub fn term_id(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    /// Inverse document frequency of a term-id
    pub fn idf(&self, term_id: usize) -> Option<f64> {
        self.idf.get(term_id).copied()
    }

    /// Configuration the model was built with
    pub fn config(&self) -> &TextModelConfig {
        &self.config
    }

    /// Number of training documents
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

impl TextModel for TfIdfModel {
    fn vectorize(&self, text: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in self.tokens(text) {
            if let Some(id) = self.term_id(&token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = FeatureVector::from_pairs(counts.into_iter().filter_map(|(id, tf)| {
            let weight = if self.config.tfidf { tf * self.idf[id] } else { tf };
            (weight.abs() > 1e-12).then_some((id, weight))
        }));
        vector.normalize();
        vector
    }

    fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }
}
