use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::OutputFormat;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GOCAM_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "gocam.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub minerva: MinervaConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

/// Model service endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct MinervaConfig {
    /// Index of all model ids.
    #[serde(default = "default_ids_url")]
    pub ids_url: String,
    /// Base URL; the model's local id is appended as the last path segment.
    #[serde(default = "default_model_url")]
    pub model_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MinervaConfig {
    fn default() -> Self {
        Self {
            ids_url: default_ids_url(),
            model_url: default_model_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// `download` command settings
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub output_dir: PathBuf,
    /// Aggregate file stem; the extension follows `--format`.
    #[serde(default = "default_models_file")]
    pub models_file: String,
    /// Bulk download manifest.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Attempts per model when rate limited.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_wait_secs")]
    pub initial_wait_secs: u64,
    /// Models fetched at once. 1 keeps the download sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_download_dir(),
            models_file: default_models_file(),
            manifest: default_manifest(),
            max_retries: default_max_retries(),
            initial_wait_secs: default_initial_wait_secs(),
            concurrency: default_concurrency(),
        }
    }
}

/// `transform` command settings
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_transform_input")]
    pub input: PathBuf,
    #[serde(default = "default_transform_output_dir")]
    pub output_dir: PathBuf,
    /// Prefix of the `<name>_nodes.tsv` / `<name>_edges.tsv` files.
    #[serde(default = "default_transform_name")]
    pub name: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            input: default_transform_input(),
            output_dir: default_transform_output_dir(),
            name: default_transform_name(),
        }
    }
}

fn default_ids_url() -> String {
    "https://api.geneontology.org/api/gocam/models".to_string()
}

fn default_model_url() -> String {
    "https://api.geneontology.org/api/go-cam".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("gocam-modular/{}", env!("CARGO_PKG_VERSION"))
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_models_file() -> String {
    "gocam_models".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("download.yaml")
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_wait_secs() -> u64 {
    1
}

fn default_concurrency() -> usize {
    1
}

fn default_transform_input() -> PathBuf {
    PathBuf::from("data/gocam_models.json")
}

fn default_transform_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_transform_name() -> String {
    "gocam".to_string()
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) first.
    /// Looks for a config file in this order:
    /// 1. Path specified in GOCAM_CONFIG environment variable (must exist)
    /// 2. ./gocam.toml in current directory
    ///
    /// With neither available the built-in defaults are used.
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(local);
        }

        log::debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.minerva.ids_url).with_context(|| {
            format!("minerva.ids_url is not a valid URL: {}", self.minerva.ids_url)
        })?;
        url::Url::parse(&self.minerva.model_url).with_context(|| {
            format!("minerva.model_url is not a valid URL: {}", self.minerva.model_url)
        })?;

        if self.minerva.timeout_secs == 0 {
            anyhow::bail!("minerva.timeout_secs must be greater than 0");
        }

        if self.download.max_retries == 0 {
            anyhow::bail!("download.max_retries must be greater than 0");
        }

        if self.download.concurrency == 0 {
            anyhow::bail!("download.concurrency must be greater than 0");
        }

        if self.download.models_file.trim().is_empty() {
            anyhow::bail!("download.models_file must not be empty");
        }

        if self.transform.name.trim().is_empty() {
            anyhow::bail!("transform.name must not be empty");
        }

        Ok(())
    }

    /// Path of the aggregate models file for the given format
    pub fn models_path(&self, format: OutputFormat) -> PathBuf {
        self.download
            .output_dir
            .join(format!("{}.{}", self.download.models_file, format.extension()))
    }
}
