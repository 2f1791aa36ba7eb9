use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use whiff::{
    load_catalog, load_json, load_training_records, ArtifactStore, Artifacts, RatingInput, Recommender,
    UserContext, WhiffConfig,
};

/// Emotion-and-note perfume recommender
#[derive(Parser, Debug)]
#[command(name = "whiff")]
#[command(about = "Emotion-and-note perfume recommender", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the vectorizer, encoder and classifier on a labelled dataset
    Train {
        /// JSON array of training records
        #[arg(long)]
        dataset: PathBuf,

        /// Where to write the artifact bundle
        #[arg(long, default_value = "./whiff.bin")]
        artifacts: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score a catalog for one user context
    Recommend {
        /// Artifact bundle written by `train`
        #[arg(long, default_value = "./whiff.bin")]
        artifacts: PathBuf,

        /// JSON array of catalog items
        #[arg(long)]
        catalog: PathBuf,

        /// JSON object with the six context fields
        #[arg(long)]
        context: PathBuf,

        /// JSON object mapping surfaced notes to 1-5 ratings; runs stage 2
        #[arg(long)]
        ratings: Option<PathBuf>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // logs go to stderr so stdout stays valid JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train {
            dataset,
            artifacts,
            config,
        } => train(dataset, artifacts, config),
        Command::Recommend {
            artifacts,
            catalog,
            context,
            ratings,
            config,
        } => recommend(artifacts, catalog, context, ratings, config),
    }
}

fn train(dataset: PathBuf, artifacts: PathBuf, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = WhiffConfig::load_or_default(config.as_deref())?;
    info!("Starting whiff v{} training", env!("CARGO_PKG_VERSION"));

    let records = load_training_records(&dataset)?;
    let (bundle, report) =
        Artifacts::fit(&records, &config.training).context("training failed")?;
    ArtifactStore::new(&artifacts).save(&bundle)?;

    println!("{}", report.evaluation);
    println!("Macro F1:    {:.4}", report.evaluation.macro_f1());
    println!("Weighted F1: {:.4}", report.evaluation.weighted_f1());
    info!("Artifacts written to {:?}", artifacts);
    Ok(())
}

fn recommend(
    artifacts: PathBuf,
    catalog: PathBuf,
    context: PathBuf,
    ratings: Option<PathBuf>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = WhiffConfig::load_or_default(config.as_deref())?;
    let bundle = Arc::new(ArtifactStore::new(&artifacts).load()?);
    let recommender = Recommender::new(bundle, config.recommender)?;

    let catalog = load_catalog(&catalog)?;
    let context: UserContext = load_json(&context)?;

    let stage1 = recommender.score_stage1(&context, &catalog)?;
    let mut output = serde_json::Map::new();
    output.insert("stage1".to_string(), serde_json::to_value(&stage1)?);
    if let Some(path) = ratings {
        let ratings: HashMap<String, RatingInput> = load_json(&path)?;
        let stage2 = recommender.score_stage2_with_stats(&catalog, &stage1, &ratings)?;
        info!(
            results = stage2.stats.results_count,
            strong = stage2.stats.strong_matches,
            "stage 2 complete"
        );
        output.insert("stage2".to_string(), serde_json::to_value(&stage2)?);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
