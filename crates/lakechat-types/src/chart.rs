//! Declarative chart descriptions returned by the query backend.
//!
//! A `ChartSpec` is opaque to the chat session: it is persisted and handed to
//! a chart surface as-is. Only `kind` is interpreted, and only by renderers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual form of a chart.
///
/// Unknown kinds deserialize to `Other` so that a new chart type on the
/// backend does not turn a valid reply into a malformed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Scatter,
    Area,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Line => write!(f, "line"),
            ChartKind::Pie => write!(f, "pie"),
            ChartKind::Scatter => write!(f, "scatter"),
            ChartKind::Area => write!(f, "area"),
            ChartKind::Other => write!(f, "other"),
        }
    }
}

/// Renderer-agnostic chart description: a kind plus its series data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default, alias = "type", alias = "chart_type")]
    pub kind: ChartKind,
    /// Series payload, passed through to the renderer untouched.
    #[serde(default)]
    pub series: serde_json::Value,
}

impl ChartSpec {
    /// Number of series when `series` is an array, otherwise 0 or 1.
    pub fn series_count(&self) -> usize {
        match &self.series {
            serde_json::Value::Array(items) => items.len(),
            serde_json::Value::Null => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_kind_falls_back_to_other() {
        let spec: ChartSpec =
            serde_json::from_value(json!({"kind": "sankey", "series": []})).unwrap();
        assert_eq!(spec.kind, ChartKind::Other);
    }

    #[test]
    fn test_kind_accepts_type_alias() {
        let spec: ChartSpec =
            serde_json::from_value(json!({"type": "line", "series": [{"name": "q1"}]})).unwrap();
        assert_eq!(spec.kind, ChartKind::Line);
        assert_eq!(spec.series_count(), 1);
    }

    #[test]
    fn test_missing_series_is_null() {
        let spec: ChartSpec = serde_json::from_value(json!({"kind": "pie"})).unwrap();
        assert_eq!(spec.series, serde_json::Value::Null);
        assert_eq!(spec.series_count(), 0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ChartKind::Bar.to_string(), "bar");
        assert_eq!(ChartKind::Other.to_string(), "other");
    }
}
