//! Normalization of backend replies into timeline messages.

use chrono::Utc;
use lakechat_types::chart::ChartSpec;
use lakechat_types::message::{Message, NewMessage, Sender};
use lakechat_types::query::QueryResult;

/// Caption stored as the text of assistant replies that carry a chart.
pub const CHART_CAPTION: &str = "Here is a chart based on your query.";

/// Text of the local error bubble shown when a query fails.
pub const REPLY_FAILED_TEXT: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

/// Build the assistant message for a backend reply, ready for the store.
pub fn reply_message(result: QueryResult) -> NewMessage {
    let (text, chart_spec) = match result {
        QueryResult::Text { answer } => (answer, None),
        QueryResult::Graph { graph_data } => (CHART_CAPTION.to_string(), Some(graph_data)),
    };

    NewMessage {
        sender: Sender::Assistant,
        text,
        timestamp: Utc::now(),
        chart_spec,
    }
}

/// Renderable shape of a timeline message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageView<'a> {
    Text {
        sender: Sender,
        text: &'a str,
        is_error: bool,
    },
    Chart {
        caption: &'a str,
        spec: &'a ChartSpec,
    },
}

impl MessageView<'_> {
    pub fn is_chart(&self) -> bool {
        matches!(self, MessageView::Chart { .. })
    }
}

/// Classify a message for display.
///
/// Only assistant messages can render as charts; a chart on a user or error
/// message is ignored.
pub fn view(message: &Message) -> MessageView<'_> {
    match (&message.chart_spec, message.sender, message.is_error) {
        (Some(spec), Sender::Assistant, false) => MessageView::Chart {
            caption: &message.text,
            spec,
        },
        _ => MessageView::Text {
            sender: message.sender,
            text: &message.text,
            is_error: message.is_error,
        },
    }
}
