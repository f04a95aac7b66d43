//! Replies from the remote analytics backend.

use serde::{Deserialize, Serialize};

use crate::chart::ChartSpec;

/// Typed reply of `POST /api/process-query`.
///
/// The wire shape is internally tagged by `type`:
/// `{"type": "text", "answer": "..."}` or `{"type": "graph", "graphData": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryResult {
    Text {
        answer: String,
    },
    Graph {
        #[serde(rename = "graphData")]
        graph_data: ChartSpec,
    },
}

impl QueryResult {
    /// Whether the reply carries chart data.
    pub fn is_graph(&self) -> bool {
        matches!(self, QueryResult::Graph { .. })
    }
}
