//! Stratified k-fold evaluation of text classifiers
//!
//! Every fold builds its own [`TfIdfModel`] from the training texts only, so
//! test texts never leak into the vocabulary or the idf weights.

use crate::api::TextClassifier;
use crate::core::{
    Label, LabeledRecord, NoProgress, OptimizerConfig, Progress, Result, SVMError, TextModel,
};
use crate::data::{RecordOptions, RecordReader};
use crate::encoding::LabelEncoder;
use crate::text::{TextModelConfig, TfIdfModel};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Options shared by the k-fold functions
#[derive(Debug, Clone, PartialEq)]
pub struct KFoldOptions {
    /// Number of folds
    pub n_folds: usize,
    /// Seed of the fold shuffle
    pub seed: u64,
    /// How records are read from files
    pub records: RecordOptions,
    /// Optimizer settings of every fold's classifier
    pub svc: OptimizerConfig,
}

impl Default for KFoldOptions {
    fn default() -> Self {
        Self {
            n_folds: 10,
            seed: 0,
            records: RecordOptions::default(),
            svc: OptimizerConfig::default(),
        }
    }
}

impl KFoldOptions {
    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_records(mut self, records: RecordOptions) -> Self {
        self.records = records;
        self
    }

    pub fn with_svc(mut self, svc: OptimizerConfig) -> Self {
        self.svc = svc;
        self
    }
}

/// Sample indices of one fold, both ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits samples into folds that keep the class proportions
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_folds: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_folds: usize, seed: u64) -> Self {
        Self { n_folds, seed }
    }

    /// Split samples with the given class codes.
    ///
    /// Members of each class are shuffled and dealt into `n_folds` contiguous
    /// chunks, the first `count % n_folds` chunks one larger than the rest.
    pub fn split(&self, codes: &[usize]) -> Result<Vec<Fold>> {
        let n_samples = codes.len();
        if self.n_folds < 2 {
            return Err(SVMError::InvalidParameter(format!(
                "n_folds must be at least 2, got {}",
                self.n_folds
            )));
        }
        if self.n_folds > n_samples {
            return Err(SVMError::InvalidParameter(format!(
                "n_folds ({}) cannot exceed the number of samples ({n_samples})",
                self.n_folds
            )));
        }

        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &code) in codes.iter().enumerate() {
            by_class.entry(code).or_default().push(i);
        }

        if by_class.values().all(|members| members.len() < self.n_folds) {
            return Err(SVMError::InvalidParameter(format!(
                "every class has fewer than n_folds ({}) members",
                self.n_folds
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fold_of = vec![0; n_samples];

        for (code, members) in by_class.iter_mut() {
            if members.len() < self.n_folds {
                warn!(
                    "class {code} has only {} members, fewer than {} folds",
                    members.len(),
                    self.n_folds
                );
            }

            members.shuffle(&mut rng);
            let base = members.len() / self.n_folds;
            let extra = members.len() % self.n_folds;
            let mut start = 0;
            for fold in 0..self.n_folds {
                let size = base + usize::from(fold < extra);
                for &i in &members[start..start + size] {
                    fold_of[i] = fold;
                }
                start += size;
            }
        }

        Ok((0..self.n_folds)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&i| fold_of[i] == fold);
                Fold { train, test }
            })
            .collect())
    }
}

/// Result of a k-fold run: predictions without a text configuration,
/// accuracy with one
#[derive(Debug, Clone, PartialEq)]
pub enum KFoldOutcome<L = Label> {
    /// Out-of-fold prediction for every record, in input order
    Predictions(Vec<L>),
    /// Fraction of correct out-of-fold predictions
    Accuracy(f64),
}

impl<L> KFoldOutcome<L> {
    pub fn predictions(&self) -> Option<&[L]> {
        match self {
            KFoldOutcome::Predictions(labels) => Some(labels),
            KFoldOutcome::Accuracy(_) => None,
        }
    }

    pub fn accuracy(&self) -> Option<f64> {
        match self {
            KFoldOutcome::Predictions(_) => None,
            KFoldOutcome::Accuracy(accuracy) => Some(*accuracy),
        }
    }
}

/// Run k-fold evaluation over a labeled record file
pub fn predict_kfold<P: AsRef<Path>>(
    path: P,
    config: Option<&TextModelConfig>,
    options: &KFoldOptions,
) -> Result<KFoldOutcome> {
    predict_kfold_with_progress(path, config, options, &mut NoProgress)
}

/// [`predict_kfold`] reporting one step per fold
pub fn predict_kfold_with_progress<P: AsRef<Path>>(
    path: P,
    config: Option<&TextModelConfig>,
    options: &KFoldOptions,
    progress: &mut dyn Progress,
) -> Result<KFoldOutcome> {
    let records = RecordReader::new(options.records.clone()).read_labeled(path)?;
    predict_kfold_records_with_progress(&records, config, options, progress)
}

/// Run k-fold evaluation over records already in memory
pub fn predict_kfold_records(
    records: &[LabeledRecord],
    config: Option<&TextModelConfig>,
    options: &KFoldOptions,
) -> Result<KFoldOutcome> {
    predict_kfold_records_with_progress(records, config, options, &mut NoProgress)
}

/// [`predict_kfold_records`] reporting one step per fold
pub fn predict_kfold_records_with_progress(
    records: &[LabeledRecord],
    config: Option<&TextModelConfig>,
    options: &KFoldOptions,
    progress: &mut dyn Progress,
) -> Result<KFoldOutcome> {
    if records.is_empty() {
        return Err(SVMError::EmptyDataset);
    }

    let labels: Vec<Label> = records.iter().map(|r| r.label.clone()).collect();
    let encoder = LabelEncoder::fitted(&labels)?;
    let codes = encoder.transform(&labels)?;
    let folds = StratifiedKFold::new(options.n_folds, options.seed).split(&codes)?;
    let text_config = config.cloned().unwrap_or_default();

    let mut predicted = vec![0; records.len()];
    progress.start(folds.len());

    for (k, fold) in folds.iter().enumerate() {
        let train_texts: Vec<&str> = fold.train.iter().map(|&i| records[i].text.as_str()).collect();
        let model = Arc::new(TfIdfModel::fit(&train_texts, &text_config)?);

        let x_train = model.vectorize_batch(&train_texts);
        let y_train: Vec<usize> = fold.train.iter().map(|&i| codes[i]).collect();

        let mut classifier = TextClassifier::new(model.clone()).with_config(options.svc.clone());
        classifier.fit(&x_train, &y_train)?;

        let test_texts: Vec<&str> = fold.test.iter().map(|&i| records[i].text.as_str()).collect();
        let x_test = model.vectorize_batch(&test_texts);
        for (&i, code) in fold.test.iter().zip(classifier.predict(&x_test)?) {
            predicted[i] = code;
        }

        debug!(
            "fold {}/{}: {} train, {} test, {} terms",
            k + 1,
            folds.len(),
            fold.train.len(),
            fold.test.len(),
            model.num_terms()
        );
        progress.advance();
    }

    progress.finish();

    match config {
        None => Ok(KFoldOutcome::Predictions(encoder.inverse_transform(&predicted)?)),
        Some(_) => {
            let correct = predicted.iter().zip(&codes).filter(|(p, c)| p == c).count();
            Ok(KFoldOutcome::Accuracy(correct as f64 / records.len() as f64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced_codes() -> Vec<usize> {
        vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]
    }

    fn records() -> Vec<LabeledRecord> {
        let positive = ["happy good", "good happy day", "so happy", "happy times", "good good"];
        let negative = ["sad bad", "bad sad day", "so sad", "sad times", "bad bad"];
        positive
            .iter()
            .map(|t| LabeledRecord::new(*t, Label::from("pos")))
            .chain(negative.iter().map(|t| LabeledRecord::new(*t, Label::from("neg"))))
            .collect()
    }

    fn options() -> KFoldOptions {
        KFoldOptions::default().with_n_folds(5)
    }

    fn words() -> TextModelConfig {
        TextModelConfig::default().with_token_list(vec![-1])
    }

    #[test]
    fn test_folds_are_exhaustive_and_disjoint() {
        let codes = vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 0, 1, 2];
        let folds = StratifiedKFold::new(3, 7).split(&codes).unwrap();

        let mut seen = vec![0; codes.len()];
        for fold in &folds {
            for &i in &fold.test {
                seen[i] += 1;
            }
            assert_eq!(fold.train.len() + fold.test.len(), codes.len());
            assert!(fold.train.iter().all(|i| !fold.test.contains(i)));
            assert!(fold.test.windows(2).all(|w| w[0] < w[1]));
            assert!(fold.train.windows(2).all(|w| w[0] < w[1]));
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_stratification() {
        let codes = balanced_codes();
        let folds = StratifiedKFold::new(5, 0).split(&codes).unwrap();

        assert_eq!(folds.len(), 5);
        for fold in &folds {
            assert_eq!(fold.test.len(), 2);
            assert_eq!(fold.test.iter().filter(|&&i| codes[i] == 0).count(), 1);
            assert_eq!(fold.test.iter().filter(|&&i| codes[i] == 1).count(), 1);
        }
    }

    #[test]
    fn test_uneven_class_sizes() {
        // 7 members over 3 folds: 3, 2, 2
        let codes = vec![0; 7];
        let folds = StratifiedKFold::new(3, 1).split(&codes).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
    }

    #[test]
    fn test_split_is_deterministic() {
        let codes = vec![0, 1, 0, 1, 0, 1, 0, 1, 2, 2, 2, 2];
        let a = StratifiedKFold::new(4, 42).split(&codes).unwrap();
        let b = StratifiedKFold::new(4, 42).split(&codes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_errors() {
        let codes = balanced_codes();
        assert!(matches!(
            StratifiedKFold::new(1, 0).split(&codes),
            Err(SVMError::InvalidParameter(_))
        ));
        assert!(matches!(
            StratifiedKFold::new(11, 0).split(&codes),
            Err(SVMError::InvalidParameter(_))
        ));
        assert!(matches!(
            StratifiedKFold::new(6, 0).split(&codes),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_small_class_still_splits() {
        let codes = vec![0, 0, 0, 0, 1];
        let folds = StratifiedKFold::new(4, 0).split(&codes).unwrap();
        let total: usize = folds.iter().map(|f| f.test.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_predictions_mode() {
        let records = records();
        let outcome = predict_kfold_records(&records, None, &options()).unwrap();

        let predictions = outcome.predictions().expect("predictions expected");
        assert_eq!(predictions.len(), records.len());
        assert!(predictions
            .iter()
            .all(|l| *l == Label::from("pos") || *l == Label::from("neg")));
        assert_eq!(outcome.accuracy(), None);
    }

    #[test]
    fn test_accuracy_mode() {
        let outcome = predict_kfold_records(&records(), Some(&words()), &options()).unwrap();

        let accuracy = outcome.accuracy().expect("accuracy expected");
        assert!((0.0..=1.0).contains(&accuracy));
        assert!(outcome.predictions().is_none());
    }

    #[test]
    fn test_accuracy_agrees_with_predictions() {
        let records = records();
        let predicted = predict_kfold_records(&records, None, &options()).unwrap();
        let predictions = predicted.predictions().expect("predictions expected");
        let correct = predictions
            .iter()
            .zip(&records)
            .filter(|(p, r)| **p == r.label)
            .count();

        let scored =
            predict_kfold_records(&records, Some(&TextModelConfig::default()), &options()).unwrap();
        assert_eq!(
            scored.accuracy(),
            Some(correct as f64 / records.len() as f64)
        );
    }

    #[test]
    fn test_outcome_is_deterministic() {
        let records = records();
        let a = predict_kfold_records(&records, None, &options()).unwrap();
        let b = predict_kfold_records(&records, None, &options()).unwrap();
        assert_eq!(a, b);
    }

    #[derive(Default)]
    struct Counter {
        total: usize,
        steps: usize,
        finished: bool,
    }

    impl Progress for Counter {
        fn start(&mut self, total: usize) {
            self.total = total;
        }

        fn advance(&mut self) {
            self.steps += 1;
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_progress_reported_per_fold() {
        let mut counter = Counter::default();
        predict_kfold_records_with_progress(&records(), Some(&words()), &options(), &mut counter)
            .unwrap();

        assert_eq!(counter.total, 5);
        assert_eq!(counter.steps, 5);
        assert!(counter.finished);
    }

    #[test]
    fn test_empty_records() {
        let result = predict_kfold_records(&[], None, &options());
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }
}
