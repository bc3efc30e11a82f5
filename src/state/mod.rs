//! State management module.
//!
//! Contains the nickname registry (shared by every session) and the
//! per-connection session state machine.

mod registry;
mod session;
mod uid;

pub use registry::{NickRegistry, Sink};
pub use session::SessionState;
pub use uid::{SessionId, SessionIdGenerator};
