//! Bulk download manifest (`download.yaml`): extra files mirrored into the
//! data directory before models are fetched.
//!
//! ```yaml
//! - url: https://example.org/ontology/go.json
//!   local_name: go.json
//! - url: https://example.org/mappings/uniprot.tsv   # saved as uniprot.tsv
//! ```

use reqwest::Client;
use serde::Deserialize;
use std::path::{Component, Path};

use crate::error::{GocamError, Result};

/// One file to mirror
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    /// Target file name relative to the output directory. Defaults to the
    /// last path segment of `url`.
    #[serde(default)]
    pub local_name: Option<String>,
}

impl ManifestEntry {
    /// Resolved target name, relative to the output directory.
    pub fn target_name(&self) -> Result<String> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| GocamError::Manifest(format!("invalid url {}: {}", self.url, e)))?;

        let name = match &self.local_name {
            Some(name) => name.clone(),
            None => parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
                .ok_or_else(|| {
                    GocamError::Manifest(format!(
                        "cannot derive local_name from {}; set it explicitly",
                        self.url
                    ))
                })?,
        };

        let path = Path::new(&name);
        let escapes = path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if name.trim().is_empty() || escapes {
            return Err(GocamError::Manifest(format!(
                "local_name must be a relative path inside the output directory: {:?}",
                name
            )));
        }
        Ok(name)
    }
}

/// Outcome counts for a manifest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestSummary {
    pub downloaded: usize,
    /// Already present and not forced.
    pub kept: usize,
    pub failed: usize,
}

fn is_blank_yaml(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

/// Parse manifest text. Empty documents give no entries; anything
/// malformed is an error.
pub fn parse_manifest(content: &str, source: &str) -> Result<Vec<ManifestEntry>> {
    if is_blank_yaml(content) {
        return Ok(Vec::new());
    }

    let entries: Option<Vec<ManifestEntry>> = serde_yaml_ng::from_str(content)
        .map_err(|e| GocamError::Manifest(format!("YAML parse error in {}: {}", source, e)))?;
    let entries = entries.unwrap_or_default();

    for entry in &entries {
        entry.target_name()?;
    }
    Ok(entries)
}

/// Load the manifest at `path`. A missing file is treated like an empty one.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    if !path.exists() {
        log::info!("No download manifest at {}, skipping", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let entries = parse_manifest(&content, &path.display().to_string())?;
    if entries.is_empty() {
        log::warn!(
            "Couldn't download anything from {} (empty?)",
            path.display()
        );
    }
    Ok(entries)
}

/// Download every entry into `output_dir`. Existing files are kept unless
/// `force`; a failed entry is logged and counted, not fatal.
pub async fn download_manifest(
    client: &Client,
    entries: &[ManifestEntry],
    output_dir: &Path,
    force: bool,
) -> Result<ManifestSummary> {
    let mut summary = ManifestSummary::default();
    if entries.is_empty() {
        return Ok(summary);
    }

    std::fs::create_dir_all(output_dir)?;

    for (idx, entry) in entries.iter().enumerate() {
        let target = output_dir.join(entry.target_name()?);

        if target.exists() && !force {
            log::info!(
                "[{}/{}] Keeping existing {} (use --force to re-download)",
                idx + 1,
                entries.len(),
                target.display()
            );
            summary.kept += 1;
            continue;
        }

        log::info!("[{}/{}] Downloading: {}", idx + 1, entries.len(), entry.url);
        match download_file(client, &entry.url, &target).await {
            Ok(bytes) => {
                summary.downloaded += 1;
                log::info!("✓ {} ({} bytes)", target.display(), bytes);
            }
            Err(e) => {
                summary.failed += 1;
                log::error!("✗ {}: {}", entry.url, e);
            }
        }
    }

    Ok(summary)
}

async fn download_file(client: &Client, url: &str, target: &Path) -> Result<usize> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.bytes().await?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, &body).await?;
    Ok(body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_manifest_entries() {
        let content = r#"
---
-
  url: https://example.org/data/go.json
  local_name: ontology/go.json
- url: https://example.org/mappings/uniprot.tsv
  tag: mappings
"#;
        let entries = parse_manifest(content, "download.yaml").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].target_name().unwrap(), "ontology/go.json");
        assert_eq!(entries[1].target_name().unwrap(), "uniprot.tsv");
    }

    #[test]
    fn test_empty_manifest_is_not_an_error() {
        assert!(parse_manifest("", "download.yaml").unwrap().is_empty());
        assert!(parse_manifest("---\n# nothing yet\n", "download.yaml")
            .unwrap()
            .is_empty());
        assert!(parse_manifest("~\n", "download.yaml").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_fatal() {
        let err = parse_manifest("- url: [unclosed\n", "download.yaml").unwrap_err();
        assert!(matches!(err, GocamError::Manifest(_)));

        let err = parse_manifest("url: https://example.org/x\n", "download.yaml").unwrap_err();
        assert!(matches!(err, GocamError::Manifest(_)));

        let err = parse_manifest("- local_name: x.json\n", "download.yaml").unwrap_err();
        assert!(err.to_string().contains("download.yaml"));
    }

    #[test]
    fn test_bad_urls_and_names_rejected() {
        assert!(parse_manifest("- url: not-a-url\n", "m").is_err());
        assert!(parse_manifest("- url: https://example.org/\n", "m").is_err());
        assert!(parse_manifest(
            "- url: https://example.org/x\n  local_name: ../escape.json\n",
            "m"
        )
        .is_err());
        assert!(parse_manifest(
            "- url: https://example.org/x\n  local_name: /etc/passwd\n",
            "m"
        )
        .is_err());
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let entries = load_manifest(&temp.path().join("download.yaml")).unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_existing_files_are_kept_without_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("go.json"), "{}").unwrap();
        let entries = vec![ManifestEntry {
            url: "https://example.invalid/go.json".to_string(),
            local_name: None,
        }];

        let summary = download_manifest(&Client::new(), &entries, temp.path(), false)
            .await
            .unwrap();
        assert_eq!(
            summary,
            ManifestSummary {
                downloaded: 0,
                kept: 1,
                failed: 0
            }
        );
        assert_eq!(std::fs::read_to_string(temp.path().join("go.json")).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_failed_entry_is_counted_not_fatal() {
        let temp = TempDir::new().unwrap();
        let entries = vec![ManifestEntry {
            // discard port; nothing listens there
            url: "http://127.0.0.1:9/missing.json".to_string(),
            local_name: None,
        }];

        let summary = download_manifest(&Client::new(), &entries, temp.path(), true)
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert!(!temp.path().join("missing.json").exists());
    }
}
