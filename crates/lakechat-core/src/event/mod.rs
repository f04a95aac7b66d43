//! Session event distribution.

pub mod bus;
