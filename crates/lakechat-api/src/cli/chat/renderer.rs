//! Timeline rendering for the terminal.
//!
//! `TimelinePrinter` prints each timeline entry once, in order. Chart replies
//! print their caption and then hand the spec to the chart slot registry,
//! which owns the drawn instance for that timeline slot.

use std::io::{self, Write};

use console::style;

use lakechat_core::render::{ChartSlotRegistry, MessageView, view};
use lakechat_types::error::RenderError;
use lakechat_types::message::{Message, Sender};

use super::chart::TerminalChartSurface;

/// Label printed in front of assistant replies.
const ASSISTANT_LABEL: &str = "Lake >";
/// Label printed in front of the user's messages.
const USER_LABEL: &str = "You >";

/// Prints timeline entries that have not been printed yet.
pub struct TimelinePrinter<W: Write> {
    charts: ChartSlotRegistry<TerminalChartSurface<W>>,
    printed: usize,
}

impl TimelinePrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TimelinePrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            charts: ChartSlotRegistry::new(TerminalChartSurface::new(out)),
            printed: 0,
        }
    }

    /// Forget everything printed, e.g. after switching rooms.
    pub fn reset(&mut self) {
        self.charts.clear();
        self.printed = 0;
    }

    /// Number of timeline entries printed so far.
    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn live_charts(&self) -> usize {
        self.charts.live_count()
    }

    /// Print entries from `timeline` past the last printed one.
    ///
    /// Entries the user typed are skipped when `echo_user` is false, since the
    /// line editor already shows them.
    pub fn print_new(&mut self, timeline: &[Message], echo_user: bool) -> Result<(), RenderError> {
        if timeline.len() < self.printed {
            // Timeline shrank underneath us: start over.
            self.reset();
        }

        for (slot, message) in timeline.iter().enumerate().skip(self.printed) {
            let entry = view(message);
            if echo_user || !matches!(entry, MessageView::Text { sender: Sender::User, .. }) {
                let out = self.charts.surface_mut().writer();
                write_entry(out, &entry).map_err(surface_error)?;
            }
            if let MessageView::Chart { spec, .. } = entry {
                self.charts.attach(slot, spec)?;
            }
        }
        self.printed = timeline.len();

        // Releases slots whose entry no longer carries a chart.
        self.charts.sync(timeline)?;
        Ok(())
    }
}

fn surface_error(e: io::Error) -> RenderError {
    RenderError::Surface(format!("failed to write timeline: {e}"))
}

/// Write one entry's text line.
fn write_entry<W: Write>(out: &mut W, entry: &MessageView<'_>) -> io::Result<()> {
    match *entry {
        MessageView::Text {
            is_error: true,
            text,
            ..
        } => writeln!(out, "  {} {}", style("!").red().bold(), style(text).red()),
        MessageView::Text {
            sender: Sender::User,
            text,
            ..
        } => writeln!(out, "  {} {}", style(USER_LABEL).green().bold(), text),
        MessageView::Text {
            sender: Sender::Assistant,
            text,
            ..
        } => writeln!(out, "  {} {}", style(ASSISTANT_LABEL).cyan().bold(), text),
        MessageView::Chart { caption, .. } => {
            writeln!(out, "  {} {}", style(ASSISTANT_LABEL).cyan().bold(), caption)
        }
    }?;
    out.flush()
}
