//! Knowledge graph module: node/edge extraction from GO-CAM models and TSV
//! output for knowledge-graph loaders.

mod extraction;
mod tsv;

pub use extraction::{extract, transform};
pub use tsv::{write_tsv, TsvPaths};

use serde::{Deserialize, Serialize};

/// A biological object or activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub category: String,
    pub taxon: String,
}

/// A relation from an activity to an associated term
/// (subject --predicate--> object), attributed to its source model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Activity id.
    pub subject: String,
    /// Association key, e.g. `enabled_by`.
    pub predicate: String,
    /// Associated term, e.g. `UniProtKB:P12345`.
    pub object: String,
    /// Same as `predicate`.
    pub relation: String,
    /// Source model id.
    pub provided_by: String,
}

/// Nodes and edges extracted from a batch of models, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}
