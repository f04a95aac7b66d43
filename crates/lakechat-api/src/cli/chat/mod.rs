//! Interactive terminal chat over a `ChatSession`.
//!
//! Reads lines with an async line editor, sends them to the active room,
//! prints new timeline entries (charts through the slot registry) and
//! handles room-management slash commands. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod chart;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
