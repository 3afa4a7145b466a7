//! Aggregate model file: written by `download`, read back by `transform`.

use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{GocamError, Result};
use crate::model::ModelRecord;

/// On-disk format of the aggregate models file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }

    /// Format implied by a file extension. Anything unrecognised is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            _ => OutputFormat::Json,
        }
    }
}

/// Write all records as one document (2-space indented JSON array, or a
/// YAML sequence). Parent directories are created as needed.
pub fn write_models(path: &Path, models: &[ModelRecord], format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, models)?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::Yaml => serde_yaml_ng::to_writer(&mut writer, models)?,
    }
    writer.flush()?;

    log::info!("Wrote {} model(s) to {}", models.len(), path.display());
    Ok(())
}

/// Read records written by [`write_models`] (or a file holding a single model).
pub fn read_models(path: &Path) -> Result<Vec<ModelRecord>> {
    let reader = BufReader::new(File::open(path)?);

    let document: Value = match OutputFormat::from_path(path) {
        OutputFormat::Json => serde_json::from_reader(reader).map_err(|e| {
            GocamError::Parse(format!("JSON parse error in {}: {}", path.display(), e))
        })?,
        OutputFormat::Yaml => serde_yaml_ng::from_reader(reader).map_err(|e| {
            GocamError::Parse(format!("YAML parse error in {}: {}", path.display(), e))
        })?,
    };

    match document {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| decode_model(path, &format!("models[{}]", idx), item))
            .collect(),
        Value::Object(map) => Ok(vec![decode_model(path, "model", Value::Object(map))?]),
        other => Err(GocamError::Parse(format!(
            "{}: expected a list of models or a single model, found {}",
            path.display(),
            value_kind(&other)
        ))),
    }
}

fn decode_model(path: &Path, location: &str, item: Value) -> Result<ModelRecord> {
    serde_json::from_value(item).map_err(|e| {
        GocamError::Parse(format!("{} in {}: {}", location, path.display(), e))
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
