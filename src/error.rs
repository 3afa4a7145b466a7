use thiserror::Error;

/// Main error type for gocam-modular
#[derive(Error, Debug)]
pub enum GocamError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encode/decode errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TSV output errors
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP transport errors outside the model fetch path
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed bulk download manifest
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A record is missing a field that extraction requires
    #[error("Missing required field `{field}` at {path}")]
    MissingField { field: &'static str, path: String },

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenient Result type using GocamError
pub type Result<T> = std::result::Result<T, GocamError>;
