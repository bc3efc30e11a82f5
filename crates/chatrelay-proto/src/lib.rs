//! # chatrelay-proto
//!
//! The wire protocol spoken between a chatrelay client and the daemon:
//! newline-delimited UTF-8 text, one command or chat line per line.
//!
//! - [`line`]: a Tokio codec framing the byte stream into lines
//! - [`command`]: turns a raw line into a typed [`Command`]
//! - [`nick`]: nickname rules
//! - [`reply`]: every line the server ever sends back
//!
//! ```rust
//! use chatrelay_proto::{Command, NickExt};
//!
//! assert_eq!(Command::parse("/register alice"), Command::Register("alice"));
//! assert_eq!(
//!     Command::parse("bob hi there"),
//!     Command::DirectMessage { to: "bob", body: "hi there" },
//! );
//! assert!(!"al ice".is_valid_nick());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod nick;
pub mod reply;

pub use self::command::{Command, Usage};
pub use self::error::ProtocolError;
#[cfg(feature = "tokio")]
pub use self::line::{Inbound, LineCodec};
pub use self::nick::{ADMIN_NICK, NickExt};
