//! Text classification with linear Support Vector Machines
//!
//! Texts are normalized, tokenized into word n-grams and character q-grams,
//! weighted by TF-IDF and classified by a linear SVM trained with dual
//! coordinate descent ("A Dual Coordinate Descent Method for Large-scale
//! Linear SVM", Hsieh et al. 2008). Stratified k-fold evaluation and a
//! random search over text model configurations are built on top.

pub mod api;
pub mod core;
pub mod data;
pub mod encoding;
pub mod kfold;
pub mod matrix;
pub mod optimizer;
pub mod persistence;
pub mod search;
pub mod solver;
pub mod text;

// Re-export main types for convenience
pub use crate::api::{ClassMetrics, EvaluationMetrics, TextClassifier};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::{RecordOptions, RecordReader};
pub use crate::encoding::LabelEncoder;
pub use crate::kfold::{predict_kfold, KFoldOptions, KFoldOutcome, StratifiedKFold};
pub use crate::matrix::FeatureMatrix;
pub use crate::optimizer::{LinearSvc, TrainedLinearSvc};
pub use crate::persistence::SavedModel;
pub use crate::search::{predict_kfold_params, Objective, ParameterSelection, ScoredConfig};
pub use crate::text::{TextModelConfig, TfIdfModel, TokenOption};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
