//! textsvc Command Line Interface
//!
//! Fit, apply and evaluate linear SVM text classifiers on JSON-lines record
//! files, run stratified k-fold evaluation and search text model
//! configurations.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use textsvc::core::{Label, Loss, Progress, Result, SVMError, TextModel};
use textsvc::data::{RecordOptions, RecordReader};
use textsvc::kfold::{predict_kfold_with_progress, KFoldOptions, KFoldOutcome};
use textsvc::persistence::SavedModel;
use textsvc::search::{KFoldObjective, ParameterSelection};
use textsvc::text::{TextModelConfig, TfIdfModel};
use textsvc::TextClassifier;

#[derive(Parser)]
#[command(name = "textsvc")]
#[command(about = "Linear SVM text classification with TF-IDF features")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a text model and classifier and save them
    Fit(FitArgs),
    /// Predict labels for a record file
    Predict(PredictArgs),
    /// Evaluate a saved model on labeled records
    Evaluate(EvaluateArgs),
    /// Stratified k-fold evaluation
    Kfold(KFoldArgs),
    /// Random search over text model configurations
    Search(SearchArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args, Clone)]
struct RecordArgs {
    /// Field holding the text
    #[arg(long, default_value = "text")]
    text_field: String,

    /// Field holding the label
    #[arg(long, default_value = "klass")]
    label_field: String,

    /// Read at most this many records
    #[arg(long)]
    max_items: Option<usize>,
}

impl From<RecordArgs> for RecordOptions {
    fn from(args: RecordArgs) -> Self {
        RecordOptions::default()
            .with_text_field(args.text_field)
            .with_label_field(args.label_field)
            .with_max_items(args.max_items)
    }
}

#[derive(Args)]
struct FitArgs {
    /// Labeled training records (JSON lines)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Text model configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Convergence tolerance
    #[arg(short, long, default_value = "0.0001")]
    epsilon: f64,

    /// Maximum iterations
    #[arg(short, long, default_value = "1000")]
    max_iterations: usize,

    /// Loss function
    #[arg(long, default_value = "squared-hinge")]
    loss: CliLoss,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum CliLoss {
    /// Hinge loss (L1-loss SVM)
    #[value(name = "hinge")]
    Hinge,
    /// Squared hinge loss (L2-loss SVM)
    #[value(name = "squared-hinge")]
    SquaredHinge,
}

impl From<CliLoss> for Loss {
    fn from(cli_loss: CliLoss) -> Self {
        match cli_loss {
            CliLoss::Hinge => Loss::Hinge,
            CliLoss::SquaredHinge => Loss::SquaredHinge,
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input records (JSON lines)
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Labeled test records (JSON lines)
    #[arg(long)]
    data: PathBuf,

    #[command(flatten)]
    records: RecordArgs,

    /// Show per-class metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct KFoldArgs {
    /// Labeled records (JSON lines)
    #[arg(long)]
    data: PathBuf,

    /// Number of folds
    #[arg(long, default_value = "10")]
    folds: usize,

    /// Seed of the fold shuffle
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Text model configuration (JSON); reports accuracy instead of predictions
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,
}

#[derive(Args)]
struct SearchArgs {
    /// Labeled records (JSON lines)
    #[arg(long)]
    data: PathBuf,

    /// Number of folds per evaluation
    #[arg(long, default_value = "10")]
    folds: usize,

    /// Number of random configurations
    #[arg(long, default_value = "10")]
    params: usize,

    /// Seed of the sampler and the fold shuffle
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Improve the best configuration by hill climbing
    #[arg(long)]
    hill_climb: bool,

    /// Write every scored configuration to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

/// Progress bar on stderr
struct BarProgress {
    message: &'static str,
    bar: Option<ProgressBar>,
}

impl BarProgress {
    fn new(message: &'static str) -> Self {
        Self { message, bar: None }
    }
}

impl Progress for BarProgress {
    fn start(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(self.message);
        self.bar = Some(bar);
    }

    fn advance(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Fit(args) => fit_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Kfold(args) => kfold_command(args),
        Commands::Search(args) => search_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn fit_command(args: FitArgs) -> Result<()> {
    info!("Fitting text classifier...");
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: C={}, epsilon={}, max_iter={}, loss={:?}",
        args.c, args.epsilon, args.max_iterations, args.loss
    );

    let config = read_text_config(args.config.as_deref())?.unwrap_or_default();
    let records = RecordReader::new(args.records.into()).read_labeled(&args.data)?;
    info!("Loaded {} records", records.len());

    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let text_model = Arc::new(TfIdfModel::fit(&texts, &config)?);
    info!("Vocabulary: {} terms", text_model.num_terms());

    let x = text_model.vectorize_batch(&texts);
    let y: Vec<Label> = records.into_iter().map(|r| r.label).collect();

    let mut classifier: TextClassifier = TextClassifier::new(text_model.clone())
        .with_c(args.c)
        .with_epsilon(args.epsilon)
        .with_max_iterations(args.max_iterations)
        .with_loss(args.loss.into());
    classifier.fit(&x, &y)?;
    info!("Training completed successfully");

    let metrics = classifier.evaluate(&x, &y)?;
    info!("Training accuracy: {:.2}%", metrics.accuracy() * 100.0);

    SavedModel::from_classifier(&text_model, &classifier)?.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let classifier = SavedModel::load_from_file(&args.model)?.into_classifier()?;

    info!("Loading prediction data from: {:?}", args.data);
    let predictions = classifier.predict_file(&args.data, &args.records.into())?;

    let mut writer = open_output(args.output.as_deref())?;
    for label in &predictions {
        write_json_line(&mut writer, label)?;
    }
    writer.flush().map_err(SVMError::IoError)?;

    if let Some(output_path) = args.output {
        info!("Predictions saved to: {output_path:?}");
    }

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let saved = SavedModel::load_from_file(&args.model)?;
    let classifier = saved.clone().into_classifier()?;

    info!("Loading test data from: {:?}", args.data);
    let metrics = classifier.evaluate_file(&args.data, &args.records.into())?;

    println!("=== Model Evaluation ===");
    saved.print_summary();

    println!("\nTest Results:");
    println!("  Samples:  {}", metrics.total());
    println!("  Accuracy: {:.2}%", metrics.accuracy() * 100.0);
    println!("  Macro F1: {:.4}", metrics.macro_f1());

    if args.detailed {
        println!("\nPer-class Metrics:");
        for class in metrics.per_class() {
            println!(
                "  {:<16} precision {:.4}  recall {:.4}  f1 {:.4}  support {}",
                class.label.to_string(),
                class.precision,
                class.recall,
                class.f1,
                class.support
            );
        }
    }

    Ok(())
}

fn kfold_command(args: KFoldArgs) -> Result<()> {
    info!("{}-fold evaluation on {:?}", args.folds, args.data);

    let config = read_text_config(args.config.as_deref())?;
    let mut options = KFoldOptions::default()
        .with_n_folds(args.folds)
        .with_seed(args.seed)
        .with_records(args.records.into());
    options.svc.c = args.c;

    let mut progress = BarProgress::new("folds");
    let outcome = predict_kfold_with_progress(&args.data, config.as_ref(), &options, &mut progress)?;

    let mut writer = open_output(args.output.as_deref())?;
    match outcome {
        KFoldOutcome::Predictions(labels) => {
            for label in &labels {
                write_json_line(&mut writer, label)?;
            }
        }
        KFoldOutcome::Accuracy(accuracy) => {
            writeln!(writer, "{accuracy:.6}").map_err(SVMError::IoError)?;
        }
    }
    writer.flush().map_err(SVMError::IoError)?;

    Ok(())
}

fn search_command(args: SearchArgs) -> Result<()> {
    info!(
        "Searching {} configurations with {}-fold evaluation on {:?}",
        args.params, args.folds, args.data
    );

    let options = KFoldOptions::default()
        .with_n_folds(args.folds)
        .with_seed(args.seed)
        .with_records(args.records.into());
    let objective = KFoldObjective::new(&args.data, options);

    let mut progress = BarProgress::new("configurations");
    let scored = ParameterSelection::new(args.seed).search_with_progress(
        &objective,
        args.params,
        args.hill_climb,
        &mut progress,
    )?;
    let best = scored.first().ok_or(SVMError::EmptyDataset)?;
    info!("Best accuracy: {:.4}", best.score);

    let json = serde_json::to_string_pretty(best)
        .map_err(|e| SVMError::SerializationError(e.to_string()))?;
    println!("{json}");

    if let Some(output_path) = args.output {
        let file = File::create(&output_path).map_err(SVMError::IoError)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &scored)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        info!("Scored configurations saved to: {output_path:?}");
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let saved = SavedModel::load_from_file(&args.model)?;

    saved.print_summary();

    // Two classes share one problem whose positive class is the second label
    let classes = saved.encoder.classes();
    let positives = if classes.len() == 2 { &classes[1..] } else { classes };

    println!("\nClass Weights:");
    for (class, (weights, bias)) in positives
        .iter()
        .zip(saved.svc.weights().iter().zip(saved.svc.biases()))
    {
        let nonzero = weights.iter().filter(|w| w.abs() > 0.0).count();
        println!("  {class} vs rest: {nonzero} non-zero weights, bias {bias:.6}");
    }

    Ok(())
}

fn read_text_config(path: Option<&Path>) -> Result<Option<TextModelConfig>> {
    let Some(path) = path else {
        return Ok(None);
    };

    info!("Loading text model configuration from: {path:?}");
    let file = File::open(path).map_err(SVMError::IoError)?;
    let config: TextModelConfig = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SVMError::SerializationError(e.to_string()))?;
    config.validate()?;
    Ok(Some(config))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(SVMError::IoError)?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn write_json_line(writer: &mut dyn Write, label: &Label) -> Result<()> {
    let json =
        serde_json::to_string(label).map_err(|e| SVMError::SerializationError(e.to_string()))?;
    writeln!(writer, "{json}").map_err(SVMError::IoError)
}
