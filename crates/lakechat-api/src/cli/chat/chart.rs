//! Terminal chart surface.
//!
//! A terminal cannot host an interactive chart, so each chart is drawn as a
//! comfy-table summary of its series (point count and value range).

use std::io::Write;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::Value;
use tracing::debug;

use lakechat_core::render::ChartSurface;
use lakechat_types::chart::ChartSpec;
use lakechat_types::error::RenderError;

/// Handle for a chart written to the terminal.
#[derive(Debug)]
pub struct TerminalChart {
    pub lines: usize,
}

/// `ChartSurface` that writes chart summaries to `W`.
pub struct TerminalChartSurface<W: Write> {
    out: W,
    draws: usize,
    releases: usize,
}

impl<W: Write> TerminalChartSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            draws: 0,
            releases: 0,
        }
    }

    /// Writer shared with the timeline text, so charts stay in order.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn releases(&self) -> usize {
        self.releases
    }
}

impl<W: Write> ChartSurface for TerminalChartSurface<W> {
    type Instance = TerminalChart;

    fn draw(&mut self, slot: usize, spec: &ChartSpec) -> Result<TerminalChart, RenderError> {
        let rendered = render_chart(spec);
        let lines = rendered.lines().count();

        writeln!(self.out, "{rendered}")
            .and_then(|()| self.out.flush())
            .map_err(|e| RenderError::Surface(format!("failed to write chart: {e}")))?;

        self.draws += 1;
        debug!(slot, lines, "Drew terminal chart");
        Ok(TerminalChart { lines })
    }

    fn release(&mut self, slot: usize, instance: TerminalChart) {
        // Scrollback cannot be erased; releasing only drops the handle.
        self.releases += 1;
        debug!(slot, lines = instance.lines, "Released terminal chart");
    }
}

/// One row of the chart summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub name: String,
    pub values: Vec<f64>,
}

impl SeriesSummary {
    fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

/// Render the indented summary block for `spec`.
pub fn render_chart(spec: &ChartSpec) -> String {
    let series = summarize_series(&spec.series);

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Series").fg(Color::White),
        Cell::new("Points").fg(Color::White),
        Cell::new("Min").fg(Color::White),
        Cell::new("Max").fg(Color::White),
    ]);

    if series.is_empty() {
        table.add_row(vec![
            Cell::new("(no data)").fg(Color::DarkGrey),
            Cell::new("0"),
            Cell::new("-"),
            Cell::new("-"),
        ]);
    }
    for summary in &series {
        table.add_row(vec![
            Cell::new(&summary.name).fg(Color::Cyan),
            Cell::new(summary.values.len().to_string()),
            Cell::new(summary.min().map(format_number).unwrap_or_else(|| "-".into())),
            Cell::new(summary.max().map(format_number).unwrap_or_else(|| "-".into())),
        ]);
    }

    let mut block = format!(
        "  {} {}\n",
        style(format!("[{} chart]", spec.kind)).magenta().bold(),
        style(format!("{} series", series.len())).dim()
    );
    for line in table.to_string().lines() {
        block.push_str("  ");
        block.push_str(line);
        block.push('\n');
    }
    block.trim_end().to_string()
}

/// Extract per-series values from the opaque series payload.
///
/// Accepts a list of `{name, data}` objects, a single such object, or a flat
/// list of numbers (one unnamed series).
pub fn summarize_series(series: &Value) -> Vec<SeriesSummary> {
    match series {
        Value::Null => Vec::new(),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_number) => {
            vec![SeriesSummary {
                name: "series 1".to_string(),
                values: items.iter().filter_map(point_value).collect(),
            }]
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| summarize_item(i, item))
            .collect(),
        other => vec![summarize_item(0, other)],
    }
}

fn summarize_item(index: usize, item: &Value) -> SeriesSummary {
    let name = ["name", "label"]
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("series {}", index + 1));

    let values = ["data", "values", "points"]
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_array))
        .map(|points| points.iter().filter_map(point_value).collect())
        .unwrap_or_default();

    SeriesSummary { name, values }
}

/// Numeric value of a data point: `3`, `{"y": 3}`, `{"value": 3}` or `[x, 3]`.
fn point_value(point: &Value) -> Option<f64> {
    match point {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => ["y", "value"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_f64)),
        Value::Array(pair) => pair.last().and_then(Value::as_f64),
        _ => None,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
