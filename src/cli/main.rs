use anyhow::Context;
use clap::{Parser, Subcommand};
use floodguard::{
    config::Config,
    logging::init_tracing,
    ml::PersistedModel,
    pipeline::{render_line, InspectionReport, Predictor, Trainer},
    AppError,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "floodguard-cli", version)]
#[command(about = "Train, query and inspect the flood-risk model", long_about = None)]
struct Cli {
    /// Model artifact path (overrides configuration)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on the dataset and persist the model
    Train {
        /// Training dataset (CSV)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Seed for noise, split and bootstrap sampling
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of trees in the forest
        #[arg(short = 'n', long)]
        n_estimators: Option<usize>,
    },

    /// Score one feature vector given as a JSON object; prints one JSON line
    Predict {
        #[arg(value_name = "FEATURES_JSON")]
        input: Option<String>,
    },

    /// Print model parameters, importances and a sample prediction
    Inspect,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if let Some(model) = cli.model {
        config.paths.model = model;
    }
    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("{}", e);
    }

    let outcome = match cli.command {
        Commands::Train {
            dataset,
            seed,
            n_estimators,
        } => {
            if let Some(dataset) = dataset {
                config.paths.dataset = dataset;
            }
            if seed.is_some() {
                config.training.seed = seed;
            }
            if let Some(n) = n_estimators {
                config.training.n_estimators = n;
            }
            train(&config)
        }
        Commands::Predict { input } => return predict(&config, input.as_deref()),
        Commands::Inspect => inspect(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn train(config: &Config) -> anyhow::Result<()> {
    println!("Reading dataset from: {}", config.paths.dataset.display());
    let report = Trainer::new(config).run().context("training failed")?;
    print!("{}", report);
    Ok(())
}

/// Exactly one JSON line on stdout. A missing model exits 1; every other
/// failure, including a missing argument, is reported in the error object
/// with exit 0.
fn predict(config: &Config, input: Option<&str>) -> ExitCode {
    let predictor = match Predictor::load(&config.paths.model) {
        Ok(predictor) => predictor,
        Err(e) => {
            println!("{}", render_line(&Err(e)));
            return ExitCode::FAILURE;
        }
    };

    let outcome = match input {
        Some(input) => predictor.predict_json(input),
        None => Err(AppError::Validation(
            "missing FEATURES_JSON argument".to_string(),
        )),
    };
    println!("{}", render_line(&outcome));
    ExitCode::SUCCESS
}

fn inspect(config: &Config) -> anyhow::Result<()> {
    println!("Opening model: {}", config.paths.model.display());
    let model = match PersistedModel::load(&config.paths.model) {
        Ok(model) => model,
        Err(e @ AppError::ModelNotFound(_)) => {
            return Err(e).context("run `floodguard-cli train` first");
        }
        Err(e) => return Err(e.into()),
    };

    let report = InspectionReport::from_model(&model)?;
    println!();
    print!("{}", report);
    Ok(())
}
