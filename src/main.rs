use anyhow::Context;
use clap::{Parser, Subcommand};
use pipeline::{Extraction, LoadOptions};
use pulse_core::{load_env, CoreError, FailureReport, PipelineConfig};
use sentiment::Annotator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str =
    "social_pulse=info,pipeline=info,reddit_client=info,database=info,sentiment=info,pulse_core=info";

#[derive(Parser)]
#[command(name = "social-pulse")]
#[command(about = "Collects subreddit posts and comments, scores sentiment and loads the results")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the feed for matching posts and fetch their comments
    Extract,
    /// Clean and annotate the raw JSON files into Parquet
    Transform,
    /// Load the Parquet files into Postgres and MongoDB
    Load {
        #[command(flatten)]
        sinks: SinkArgs,
    },
    /// Add sentiment fields to a JSON array of comments
    Annotate {
        /// Input JSON file (defaults to the raw comments file)
        input: Option<PathBuf>,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract, transform and load in one go
    Run {
        #[command(flatten)]
        sinks: SinkArgs,
    },
}

#[derive(clap::Args)]
struct SinkArgs {
    /// Do not write posts to Postgres
    #[arg(long)]
    skip_postgres: bool,

    /// Do not write comments to MongoDB
    #[arg(long)]
    skip_mongo: bool,
}

impl SinkArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions {
            postgres: !self.skip_postgres,
            mongo: !self.skip_mongo,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CoreError>() {
                Some(core) => eprintln!("{}", FailureReport::emit(core)),
                None => error!("{:#}", err),
            }
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    load_env();
    let config = PipelineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config
        .init_directories()
        .context("creating data directories")?;

    match cli.command {
        Commands::Extract => run_extract(&config).await?,
        Commands::Transform => run_transform(&config)?,
        Commands::Load { sinks } => run_load(&config, sinks.options()).await?,
        Commands::Annotate { input, output } => {
            let input = input.unwrap_or_else(|| config.storage.raw_comments_path());
            let output = output.unwrap_or_else(|| {
                config
                    .storage
                    .processed_dir
                    .join("technology_ai_comments_sentiment.json")
            });
            let annotator: Annotator = Annotator::default();
            pipeline::annotate_json_file(&input, &output, &annotator)
                .with_context(|| format!("annotating {}", input.display()))?;
        }
        Commands::Run { sinks } => {
            run_extract(&config).await?;
            run_transform(&config)?;
            run_load(&config, sinks.options()).await?;
        }
    }

    Ok(())
}

async fn run_extract(config: &PipelineConfig) -> anyhow::Result<()> {
    let client = pipeline::reddit_client(&config.reddit).context("building Reddit client")?;
    let mut extraction = Extraction::default();

    let summary = tokio::select! {
        summary = pipeline::extract(&client, &config.reddit, &mut extraction) => Some(summary),
        _ = tokio::signal::ctrl_c() => None,
    };

    match summary {
        Some(summary) => info!(
            "Extraction finished: feed {:?}, {} posts with comments, {} skipped{}",
            summary.scan,
            summary.fetch.posts_fetched,
            summary.fetch.posts_skipped,
            if summary.fetch.rate_limited {
                " (rate limited)"
            } else {
                ""
            }
        ),
        None => warn!(
            "Interrupted, saving {} posts and {} comments collected so far",
            extraction.posts.len(),
            extraction.comments.len()
        ),
    }

    pipeline::save_extraction(&config.storage, &extraction).context("saving raw records")?;
    Ok(())
}

fn run_transform(config: &PipelineConfig) -> anyhow::Result<()> {
    let annotator: Annotator = Annotator::default();
    let summary = pipeline::transform(&config.storage, &annotator).context("transform stage")?;
    info!(
        "Transform finished: {} posts, {} comments",
        summary.posts, summary.comments
    );
    Ok(())
}

async fn run_load(config: &PipelineConfig, options: LoadOptions) -> anyhow::Result<()> {
    let summary = pipeline::load(&config.storage, options)
        .await
        .context("load stage")?;
    info!(
        "Load finished: {}/{} posts, {}/{} comments inserted",
        summary.posts_inserted, summary.posts_read, summary.comments_inserted, summary.comments_read
    );
    Ok(())
}
