//! Chat session state machine.
//!
//! `ChatSession` owns the active room, its timeline and the pending-reply
//! flag, and orchestrates store writes around backend calls.

pub mod machine;
pub mod state;

pub use machine::{ChatSession, SessionError};
pub use state::{IgnoredReason, SendOutcome, SessionPhase};
