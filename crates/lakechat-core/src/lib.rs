//! Chat session logic and port traits for lakechat.
//!
//! This crate defines the "ports" (store, backend and identity traits) that
//! the infrastructure layer implements, and the `ChatSession` state machine
//! that drives them. It depends only on `lakechat-types` -- never on
//! `lakechat-infra` or any database/HTTP crate.

pub mod backend;
pub mod event;
pub mod identity;
pub mod render;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
