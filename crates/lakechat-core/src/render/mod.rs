//! Reply renderer contract.
//!
//! Maps backend replies to timeline messages, exposes the discriminated
//! `MessageView` consumed by display layers, and owns the lifetime of chart
//! instances per timeline slot.

pub mod reply;
pub mod slots;

pub use reply::{CHART_CAPTION, MessageView, REPLY_FAILED_TEXT, reply_message, view};
pub use slots::{ChartSlotRegistry, ChartSurface};
