//! Network module.
//!
//! Contains the Gateway (TCP listener), the per-client Connection, the line
//! transport they share, and the Supervisor that ties sessions together.

mod connection;
mod gateway;
mod supervisor;
mod transport;

pub use gateway::Gateway;
pub use supervisor::Supervisor;

use std::time::Duration;

/// Lines another session may queue for one connection. Sends beyond this fail.
pub const OUTBOUND_QUEUE_LEN: usize = 64;

/// How long a closing session keeps flushing to a client before dropping it.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
