pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod model;
pub mod store;

pub use config::Config;
pub use error::{GocamError, Result};
pub use fetch::{fetch_with_retry, FetchError, MinervaClient, ModelSource, RetryPolicy};
pub use graph::{extract, Edge, Graph, Node};
pub use model::{ActivityRecord, ModelRecord, ObjectRecord};
pub use store::OutputFormat;
