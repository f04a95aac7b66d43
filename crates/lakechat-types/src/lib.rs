//! Shared domain types for lakechat.
//!
//! Rooms, messages, chart specs, backend query results, configuration and
//! the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chart;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod query;
pub mod room;
