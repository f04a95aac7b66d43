//! HTTP client for the remote query backend.

pub mod backend;

pub use backend::HttpQueryBackend;
