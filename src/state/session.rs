//! Per-connection session state.
//!
//! ```text
//! ┌──────────────┐  /register n   ┌────────────────┐
//! │ Unregistered ├───────────────▶│ Registered(n)  │◀─┐ /change_nick m
//! └──────┬───────┘                └───────┬────────┴──┘
//!        │   /quit, EOF, error, shutdown  │
//!        └──────────────┬─────────────────┘
//!                       ▼
//!                ┌────────────┐
//!                │ Terminated │
//!                └────────────┘
//! ```
//!
//! The state only records what the session *believes* it holds. The
//! registry stays authoritative; transitions here are applied after the
//! matching registry operation succeeded.

use std::mem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unregistered,
    Registered {
        nick: String,
    },
    Terminated,
}

impl SessionState {
    /// The nickname held, if registered.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Self::Registered { nick } => Some(nick),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }

    /// `Unregistered` → `Registered(nick)`. No-op in any other state.
    pub fn register(&mut self, nick: String) {
        if matches!(self, Self::Unregistered) {
            *self = Self::Registered { nick };
        }
    }

    /// `Registered(old)` → `Registered(nick)`, returning `old`.
    pub fn rename(&mut self, nick: String) -> Option<String> {
        match self {
            Self::Registered { nick: current } => Some(mem::replace(current, nick)),
            _ => None,
        }
    }

    /// Enter `Terminated`, handing back the nickname that must be released.
    pub fn terminate(&mut self) -> Option<String> {
        match mem::replace(self, Self::Terminated) {
            Self::Registered { nick } => Some(nick),
            _ => None,
        }
    }
}
