//! Sparse feature matrix
//!
//! Converts a batch of [`FeatureVector`]s into a fixed-width compressed sparse
//! row matrix the linear solver can iterate over.

use crate::core::{FeatureVector, Result, SVMError};
use log::debug;

/// Largest term space the dense solver weights are allowed to span
pub const MAX_TERMS: usize = 1 << 27;

/// Row-major sparse matrix with a fixed number of columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
    dropped: usize,
}

impl FeatureMatrix {
    /// Build a matrix from feature vectors.
    ///
    /// With `num_terms == None` the width is the largest term-id plus one.
    /// Entries whose term-id does not fit the width are dropped. A width
    /// above [`MAX_TERMS`] is `InvalidDataset`.
    pub fn from_vectors(vectors: &[FeatureVector], num_terms: Option<usize>) -> Result<Self> {
        let n_cols = match num_terms {
            Some(width) => width,
            None => match vectors.iter().filter_map(FeatureVector::max_index).max() {
                Some(idx) => idx.checked_add(1).ok_or_else(|| too_wide(idx))?,
                None => 0,
            },
        };
        if n_cols > MAX_TERMS {
            return Err(too_wide(n_cols - 1));
        }

        let mut indptr = Vec::with_capacity(vectors.len() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        let mut dropped = 0;
        indptr.push(0);

        for vector in vectors {
            for (idx, value) in vector.iter() {
                if idx < n_cols {
                    indices.push(idx);
                    values.push(value);
                } else {
                    dropped += 1;
                }
            }
            indptr.push(indices.len());
        }

        if dropped > 0 {
            debug!("Dropped {dropped} entries beyond the {n_cols}-term feature space");
        }

        Ok(Self {
            n_cols,
            indptr,
            indices,
            values,
            dropped,
        })
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Number of columns (the term space width)
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Entries that were discarded because their term-id exceeded the width
    pub fn dropped_entries(&self) -> usize {
        self.dropped
    }

    /// Column indices and values of row `i`
    ///
    /// # Panics
    /// Panics if `i >= n_rows()`
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        (&self.indices[start..end], &self.values[start..end])
    }

    /// Dot product of row `i` with a dense vector of at least `n_cols` entries
    pub fn row_dot(&self, i: usize, dense: &[f64]) -> f64 {
        let (indices, values) = self.row(i);
        indices
            .iter()
            .zip(values)
            .map(|(&idx, &value)| dense[idx] * value)
            .sum()
    }

    /// Squared L2 norm of row `i`
    pub fn row_norm_squared(&self, i: usize) -> f64 {
        self.row(i).1.iter().map(|&v| v * v).sum()
    }
}

fn too_wide(max_index: usize) -> SVMError {
    SVMError::InvalidDataset(format!(
        "term-id {max_index} exceeds the supported term space of {MAX_TERMS}"
    ))
}
