//! Integration tests for the textsvc library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use textsvc::kfold::{predict_kfold, predict_kfold_records};
use textsvc::search::{KFoldObjective, ParameterSelection};
use textsvc::{
    FeatureVector, KFoldOptions, Label, LabelEncoder, LabeledRecord, RecordOptions, RecordReader,
    SVMError, SavedModel, SparseVector, StratifiedKFold, TextClassifier, TextModel,
    TextModelConfig, TfIdfModel,
};

const POSITIVE: [&str; 6] = [
    "I love this movie, it is great",
    "what a great and happy day",
    "love love love it",
    "happy with the great service",
    "this is wonderful, I love it",
    "great food and happy people",
];

const NEGATIVE: [&str; 6] = [
    "I hate this movie, it is awful",
    "what an awful and sad day",
    "hate hate hate it",
    "sad with the awful service",
    "this is terrible, I hate it",
    "awful food and sad people",
];

fn sentiment_records() -> Vec<LabeledRecord> {
    POSITIVE
        .iter()
        .map(|t| LabeledRecord::new(*t, Label::from("positive")))
        .chain(
            NEGATIVE
                .iter()
                .map(|t| LabeledRecord::new(*t, Label::from("negative"))),
        )
        .collect()
}

fn write_records(records: &[LabeledRecord]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    for record in records {
        let line = serde_json::json!({ "text": record.text, "klass": record.label });
        writeln!(temp_file, "{line}").expect("Failed to write");
    }
    temp_file.flush().expect("Failed to flush");
    temp_file
}

fn words() -> TextModelConfig {
    TextModelConfig::default().with_token_list(vec![-1])
}

/// Test complete workflow: record loading -> text model -> training -> prediction
#[test]
fn test_complete_workflow() {
    let records = sentiment_records();
    let train_file = write_records(&records);
    let options = RecordOptions::default();

    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let model = Arc::new(TfIdfModel::with_defaults(&texts).expect("Text model should fit"));

    let mut classifier: TextClassifier = TextClassifier::new(model)
        .with_c(1.0)
        .with_epsilon(1e-4)
        .with_max_iterations(1000);
    classifier
        .fit_file(train_file.path(), &options)
        .expect("Training should succeed");

    let metrics = classifier
        .evaluate_file(train_file.path(), &options)
        .expect("Evaluation should succeed");
    assert!(
        metrics.accuracy() >= 0.8,
        "Training accuracy should be high, got: {}",
        metrics.accuracy()
    );

    let mut test_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(test_file, "{{\"text\": \"I love it, great\"}}").expect("Failed to write");
    writeln!(test_file, "{{\"text\": \"I hate it, awful\"}}").expect("Failed to write");
    test_file.flush().expect("Failed to flush");

    let predictions = classifier
        .predict_file(test_file.path(), &options)
        .expect("Prediction should succeed");
    assert_eq!(
        predictions,
        vec![Label::from("positive"), Label::from("negative")]
    );
}

/// Integer labels round-trip through the encoder and predictions
#[test]
fn test_integer_labels() {
    let mut train_file = NamedTempFile::new().expect("Failed to create temp file");
    for (text, label) in [
        ("red apple", 3),
        ("red cherry", 3),
        ("green leaf", 7),
        ("green grass", 7),
        ("blue sky", 11),
        ("blue sea", 11),
    ] {
        writeln!(train_file, "{}", serde_json::json!({ "text": text, "klass": label }))
            .expect("Failed to write");
    }
    train_file.flush().expect("Failed to flush");

    let texts = RecordReader::default()
        .read_texts(train_file.path())
        .expect("Texts should load");
    let model = Arc::new(TfIdfModel::fit(&texts, &words()).expect("Text model should fit"));

    let mut classifier: TextClassifier = TextClassifier::new(model).with_c(10.0);
    classifier
        .fit_file(train_file.path(), &RecordOptions::default())
        .expect("Training should succeed");

    assert_eq!(
        classifier.classes().unwrap(),
        &[Label::Int(3), Label::Int(7), Label::Int(11)]
    );
    assert_eq!(classifier.predict_text("red").unwrap(), Label::Int(3));
    assert_eq!(classifier.predict_text("green").unwrap(), Label::Int(7));
    assert_eq!(classifier.predict_text("blue").unwrap(), Label::Int(11));
}

#[test]
fn test_label_round_trip() {
    let labels = vec![
        Label::from("b"),
        Label::Int(2),
        Label::from("a"),
        Label::Int(2),
        Label::from("b"),
    ];
    let encoder = LabelEncoder::fitted(&labels).unwrap();
    let codes = encoder.transform(&labels).unwrap();
    assert_eq!(encoder.inverse_transform(&codes).unwrap(), labels);
}

/// Vectors from a wider term space predict exactly as their truncation
#[test]
fn test_fixed_width_prediction() {
    let records = sentiment_records();
    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let model = Arc::new(TfIdfModel::fit(&texts, &words()).unwrap());
    let x: Vec<FeatureVector> = texts.iter().map(|t| model.vectorize(t)).collect();
    let y: Vec<Label> = records.iter().map(|r| r.label.clone()).collect();

    let mut classifier: TextClassifier = TextClassifier::new(model.clone());
    classifier.fit(&x, &y).unwrap();
    let n = classifier.num_terms().unwrap();

    for vector in &x {
        let mut pairs: Vec<(usize, f64)> = vector.iter().collect();
        pairs.push((n + 5, 1.0));
        let wide = SparseVector::from_pairs(pairs);
        assert_eq!(
            classifier.predict(&[wide]).unwrap(),
            classifier.predict(&[vector.clone()]).unwrap()
        );
    }
}

#[test]
fn test_predict_text_consistency() {
    let records = sentiment_records();
    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let model = Arc::new(TfIdfModel::with_defaults(&texts).unwrap());
    let x: Vec<FeatureVector> = texts.iter().map(|t| model.vectorize(t)).collect();
    let y: Vec<Label> = records.iter().map(|r| r.label.clone()).collect();

    let mut classifier: TextClassifier = TextClassifier::new(model.clone());
    classifier.fit(&x, &y).unwrap();

    for text in ["great day", "awful service", "@someone http://t.co/x 123 :)", ""] {
        assert_eq!(
            classifier.predict_text(text).unwrap(),
            classifier.predict(&[model.vectorize(text)]).unwrap()[0]
        );
    }
}

/// Test k-fold on a record file in both output modes
#[test]
fn test_kfold_modes() {
    let records = sentiment_records();
    let file = write_records(&records);
    let options = KFoldOptions::default().with_n_folds(3);

    let outcome = predict_kfold(file.path(), None, &options).expect("k-fold should succeed");
    let predictions = outcome.predictions().expect("predictions expected");
    assert_eq!(predictions.len(), records.len());
    let correct = predictions
        .iter()
        .zip(&records)
        .filter(|(p, r)| **p == r.label)
        .count();
    let expected = correct as f64 / records.len() as f64;

    // Accuracy mode scores the same folds under the default text model
    let outcome = predict_kfold(file.path(), Some(&TextModelConfig::default()), &options)
        .expect("k-fold should succeed");
    let accuracy = outcome.accuracy().expect("accuracy expected");
    assert!((0.0..=1.0).contains(&accuracy));
    assert_eq!(accuracy, expected);

    let outcome = predict_kfold(file.path(), Some(&words()), &options).expect("k-fold should succeed");
    assert!(outcome.accuracy().is_some());
    assert!(outcome.predictions().is_none());
}

#[test]
fn test_kfold_determinism() {
    let records = sentiment_records();
    let options = KFoldOptions::default().with_n_folds(4).with_seed(9);

    let a = predict_kfold_records(&records, Some(&words()), &options).unwrap();
    let b = predict_kfold_records(&records, Some(&words()), &options).unwrap();
    assert_eq!(a, b);

    let a = predict_kfold_records(&records, None, &options).unwrap();
    let b = predict_kfold_records(&records, None, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_stratified_folds() {
    // [A x5, B x5] over 5 folds: one of each per test set
    let codes = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
    let folds = StratifiedKFold::new(5, 0).split(&codes).unwrap();

    let mut covered = Vec::new();
    for fold in &folds {
        let a = fold.test.iter().filter(|&&i| codes[i] == 0).count();
        let b = fold.test.iter().filter(|&&i| codes[i] == 1).count();
        assert_eq!((a, b), (1, 1));
        covered.extend(fold.test.iter().copied());
    }
    covered.sort_unstable();
    assert_eq!(covered, (0..10).collect::<Vec<_>>());
}

/// Custom fields and item caps flow through k-fold
#[test]
fn test_kfold_custom_fields() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    for record in sentiment_records() {
        let line = serde_json::json!({ "body": record.text, "y": record.label });
        writeln!(file, "{line}").expect("Failed to write");
    }
    file.flush().expect("Failed to flush");

    let options = KFoldOptions::default().with_n_folds(2).with_records(
        RecordOptions::default()
            .with_text_field("body")
            .with_label_field("y"),
    );
    let outcome = predict_kfold(file.path(), None, &options).unwrap();
    assert_eq!(outcome.predictions().unwrap().len(), 12);
}

#[test]
fn test_parameter_search_on_file() {
    let file = write_records(&sentiment_records());
    let objective = KFoldObjective::new(file.path(), KFoldOptions::default().with_n_folds(3));

    let scored = ParameterSelection::new(1)
        .search(&objective, 4, false)
        .expect("Search should succeed");

    assert!(!scored.is_empty());
    assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(scored.iter().all(|s| (0.0..=1.0).contains(&s.score)));
}

/// Saved models predict like the classifier they were saved from
#[test]
fn test_save_and_load() {
    let records = sentiment_records();
    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let model = TfIdfModel::with_defaults(&texts).unwrap();
    let x: Vec<FeatureVector> = texts.iter().map(|t| model.vectorize(t)).collect();
    let y: Vec<Label> = records.iter().map(|r| r.label.clone()).collect();

    let mut classifier: TextClassifier = TextClassifier::new(Arc::new(model.clone()));
    classifier.fit(&x, &y).unwrap();

    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    SavedModel::from_classifier(&model, &classifier)
        .unwrap()
        .save_to_file(temp_file.path())
        .unwrap();

    let restored = SavedModel::load_from_file(temp_file.path())
        .unwrap()
        .into_classifier()
        .unwrap();
    for text in texts {
        assert_eq!(
            restored.predict_text(text).unwrap(),
            classifier.predict_text(text).unwrap()
        );
    }
}

#[test]
fn test_error_handling() {
    // Non-existent file
    let mut classifier: TextClassifier =
        TextClassifier::new(Arc::new(TfIdfModel::with_defaults(&["x"]).unwrap()));
    let result = classifier.fit_file("/non/existent/file.json", &RecordOptions::default());
    assert!(matches!(result, Err(SVMError::IoError(_))));

    // Malformed record
    let mut bad_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(bad_file, "{{\"text\": \"ok\", \"klass\": 1}}").expect("Failed to write");
    writeln!(bad_file, "not json").expect("Failed to write");
    bad_file.flush().expect("Failed to flush");
    let result = classifier.fit_file(bad_file.path(), &RecordOptions::default());
    assert!(matches!(result, Err(SVMError::MalformedRecord { line: 2, .. })));

    // Predict before fit
    assert!(matches!(
        classifier.predict_text("x"),
        Err(SVMError::UnfittedModel)
    ));

    // Too many folds
    let records = sentiment_records();
    let result = predict_kfold_records(&records, None, &KFoldOptions::default().with_n_folds(13));
    assert!(matches!(result, Err(SVMError::InvalidParameter(_))));
}
