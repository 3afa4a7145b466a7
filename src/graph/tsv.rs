//! Tab-separated node and edge files.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::Graph;
use crate::error::Result;

const NODE_COLUMNS: [&str; 4] = ["id", "name", "category", "taxon"];
const EDGE_COLUMNS: [&str; 5] = ["subject", "predicate", "object", "relation", "provided_by"];

/// Files produced by [`write_tsv`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvPaths {
    pub nodes: PathBuf,
    pub edges: PathBuf,
}

/// Write `<name>_nodes.tsv` and `<name>_edges.tsv` under `output_dir`.
pub fn write_tsv(graph: &Graph, output_dir: &Path, name: &str) -> Result<TsvPaths> {
    std::fs::create_dir_all(output_dir)?;

    let paths = TsvPaths {
        nodes: output_dir.join(format!("{}_nodes.tsv", name)),
        edges: output_dir.join(format!("{}_edges.tsv", name)),
    };

    write_rows(&paths.nodes, &NODE_COLUMNS, &graph.nodes)?;
    write_rows(&paths.edges, &EDGE_COLUMNS, &graph.edges)?;

    Ok(paths)
}

// The header is written by hand so that empty files still carry one.
fn write_rows<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(columns)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
