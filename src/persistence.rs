//! Model serialization and persistence
//!
//! A saved model bundles the fitted text model with the classifier state so
//! that the CLI can predict raw text from a single JSON file.

use crate::api::TextClassifier;
use crate::core::{Label, OptimizerConfig, Result, SVMError, TextModel};
use crate::encoding::LabelEncoder;
use crate::optimizer::TrainedLinearSvc;
use crate::text::{TextModelConfig, TfIdfModel};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// Serializable text model plus fitted classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    /// Vocabulary, idf weights and normalization options
    pub text_model: TfIdfModel,
    /// Width of the term space the classifier was trained on
    pub num_terms: usize,
    /// Label encoding
    pub encoder: LabelEncoder<Label>,
    /// SVM weights and biases
    pub svc: TrainedLinearSvc,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Number of classes
    pub n_classes: usize,
    /// Number of documents the text model was built from
    pub n_documents: usize,
    /// Optimizer parameters used for training
    pub training_params: OptimizerConfig,
    /// Creation timestamp
    pub created_at: String,
}

impl SavedModel {
    /// Capture a fitted classifier together with the text model it was fitted with
    pub fn from_classifier(text_model: &TfIdfModel, classifier: &TextClassifier) -> Result<Self> {
        let (Some(num_terms), Some(encoder), Some(svc)) =
            (classifier.num_terms(), classifier.encoder(), classifier.svc())
        else {
            return Err(SVMError::UnfittedModel);
        };

        Ok(Self {
            text_model: text_model.clone(),
            num_terms,
            encoder: encoder.clone(),
            svc: svc.clone(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_classes: encoder.n_classes(),
                n_documents: text_model.n_documents(),
                training_params: classifier.config().clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        })
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    /// Rebuild a classifier that predicts raw text
    pub fn into_classifier(self) -> Result<TextClassifier> {
        TextClassifier::from_parts(
            self.metadata.training_params,
            Some(Arc::new(self.text_model)),
            self.num_terms,
            self.encoder,
            self.svc,
        )
    }

    /// Text model configuration
    pub fn text_config(&self) -> &TextModelConfig {
        self.text_model.config()
    }

    /// Print model summary
    pub fn print_summary(&self) {
        let classes: Vec<String> = self.encoder.classes().iter().map(|c| c.to_string()).collect();
        let config = self.text_config();

        println!("=== Text Classifier Summary ===");
        println!("Classes ({}): {}", self.metadata.n_classes, classes.join(", "));
        println!("Vocabulary: {} terms", self.text_model.num_terms());
        println!("Trained Term Space: {}", self.num_terms);
        println!("Training Documents: {}", self.metadata.n_documents);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
        println!("Text Model:");
        println!("  Token List: {:?}", config.token_list);
        println!("  TF-IDF: {}", config.tfidf);
        println!(
            "  lc={} strip_diac={} del_dup={} del_punc={}",
            config.lc, config.strip_diac, config.del_dup, config.del_punc
        );
        println!("Training Parameters:");
        println!("  C: {}", self.metadata.training_params.c);
        println!("  Epsilon: {}", self.metadata.training_params.epsilon);
        println!(
            "  Max Iterations: {}",
            self.metadata.training_params.max_iterations
        );
        println!("  Loss: {:?}", self.metadata.training_params.loss);
    }
}
