//! Infrastructure layer for lakechat.
//!
//! Contains implementations of the port traits defined in `lakechat-core`:
//! the SQLite message store, the HTTP query backend client and the static
//! identity source, plus configuration loading and data directory layout.

pub mod config;
pub mod http;
pub mod identity;
pub mod sqlite;
