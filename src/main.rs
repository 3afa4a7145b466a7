use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gocam_modular::download::{download_manifest, load_manifest};
use gocam_modular::fetch::{fetch_all, MinervaClient, ModelSource, RetryPolicy};
use gocam_modular::graph::{transform, write_tsv};
use gocam_modular::store::{read_models, write_models, OutputFormat};
use gocam_modular::Config;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "gocam-modular", version)]
#[command(about = "Download GO-CAM models and transform them into node/edge TSV files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the files in download.yaml, then every GO-CAM model
    Download {
        /// Format of the aggregate models file
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Force download of data, even if it exists
        #[arg(long)]
        force: bool,
    },

    /// Transform downloaded models into node and edge TSV files
    Transform {
        /// Output directory for transformed data
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of models to process
        #[arg(long)]
        row_limit: Option<usize>,

        /// Whether to be verbose
        #[arg(short, long)]
        verbose: bool,

        /// Models file to read (defaults to transform.input from config)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        Commands::Transform { verbose: true, .. } => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", default_filter)
    ).init();

    let config = Config::load()?;

    match cli.command {
        Commands::Download { format, force } => run_download(&config, format, force).await,
        Commands::Transform {
            output_dir,
            row_limit,
            input,
            ..
        } => run_transform(&config, input, output_dir, row_limit),
    }
}

/// Mirror the manifest files, fetch all models, write the aggregate file
async fn run_download(config: &Config, format: OutputFormat, force: bool) -> Result<()> {
    log::info!("Downloading data for gocam-modular v{}", env!("CARGO_PKG_VERSION"));
    let start = Instant::now();

    let entries = load_manifest(&config.download.manifest)
        .with_context(|| format!("Failed to load {}", config.download.manifest.display()))?;
    if !entries.is_empty() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.minerva.timeout_secs))
            .user_agent(config.minerva.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        let manifest =
            download_manifest(&client, &entries, &config.download.output_dir, force).await?;
        log::info!(
            "Manifest: downloaded={}, kept={}, failed={}",
            manifest.downloaded,
            manifest.kept,
            manifest.failed
        );
    }

    let source = MinervaClient::new(&config.minerva)?;
    let ids = source
        .model_ids()
        .await
        .with_context(|| format!("Failed to list models from {}", config.minerva.ids_url))?;
    log::info!("Found {} model(s) to fetch", ids.len());

    let policy = RetryPolicy::from_config(&config.download);
    let (models, summary) = fetch_all(&source, &ids, &policy, config.download.concurrency).await;

    let path = config.models_path(format);
    write_models(&path, &models, format)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("=== Download Complete ===");
    log::info!("Models requested: {}", summary.requested);
    log::info!("Models fetched: {}", summary.fetched);
    log::info!("Models skipped: {}", summary.skipped);
    log::info!("Output: {}", path.display());
    log::info!("Time: {:?}", start.elapsed());

    if summary.skipped > 0 {
        log::warn!("Some models were skipped. Check logs above for details.");
    }

    Ok(())
}

/// Read the aggregate file and write node/edge TSVs
fn run_transform(
    config: &Config,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    row_limit: Option<usize>,
) -> Result<()> {
    log::info!("Transforming data for gocam-modular...");

    let input = input.unwrap_or_else(|| config.transform.input.clone());
    let output_dir = output_dir.unwrap_or_else(|| config.transform.output_dir.clone());

    let models = read_models(&input)
        .with_context(|| format!("Failed to read models from {}", input.display()))?;
    log::info!("Loaded {} model(s) from {}", models.len(), input.display());

    let graph = transform(&models, row_limit)?;
    let paths = write_tsv(&graph, &output_dir, &config.transform.name)?;

    log::info!("=== Transform Complete ===");
    log::info!("Nodes: {} -> {}", graph.nodes.len(), paths.nodes.display());
    log::info!("Edges: {} -> {}", graph.edges.len(), paths.edges.display());

    Ok(())
}
