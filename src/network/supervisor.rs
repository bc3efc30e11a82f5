//! Session supervision and the shutdown protocol.
//!
//! The Supervisor owns the nickname registry and the set of live sessions.
//! Sessions register themselves on accept and leave when their loop returns;
//! the set exists so shutdown knows whom to notify and close.

use crate::state::{NickRegistry, SessionId};
use chatrelay_proto::reply;
use dashmap::DashMap;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A session known to the supervisor.
#[derive(Debug)]
struct TrackedSession {
    addr: SocketAddr,
    /// Cancelling closes the session's connection.
    cancel: CancellationToken,
}

/// What [`Supervisor::close_all`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CloseSummary {
    /// Registered users that were sent the shutdown notice.
    pub notified: usize,
    /// Registered users whose notice could not be queued.
    pub unreachable: usize,
    /// Sessions told to close.
    pub closed: usize,
    /// Registry entries dropped.
    pub cleared: usize,
}

/// Shared lifecycle state for the gateway and every session.
#[derive(Debug, Default)]
pub struct Supervisor {
    registry: NickRegistry,
    sessions: DashMap<SessionId, TrackedSession>,
    shutdown: CancellationToken,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &NickRegistry {
        &self.registry
    }

    /// Start tracking a session. The returned token closes it when cancelled.
    pub fn track(&self, id: SessionId, addr: SocketAddr) -> CancellationToken {
        let cancel = CancellationToken::new();
        self.sessions.insert(
            id,
            TrackedSession {
                addr,
                cancel: cancel.clone(),
            },
        );
        debug!(session = %id, %addr, tracked = self.sessions.len(), "Session tracked");
        cancel
    }

    /// Stop tracking a session whose loop has returned.
    pub fn untrack(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            debug!(session = %id, tracked = self.sessions.len(), "Session untracked");
        }
        removed
    }

    pub fn tracked_count(&self) -> usize {
        self.sessions.len()
    }

    /// Ask the gateway to run the shutdown protocol. Safe to call repeatedly
    /// and from any task.
    pub fn request_shutdown(&self) {
        if !self.is_shutting_down() {
            info!("Shutdown requested");
            self.shutdown.cancel();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once shutdown has been requested.
    pub async fn shutdown_requested(&self) {
        self.shutdown.cancelled().await;
    }

    /// Notify every registered user, close every tracked session, then
    /// empty the registry.
    ///
    /// Notices are queued without waiting; a full or closed queue is logged
    /// and skipped. Closing is a cancellation: each session drains what is
    /// already queued (the notice included) before it closes its connection.
    pub fn close_all(&self) -> CloseSummary {
        let mut summary = CloseSummary::default();

        for (nick, sink) in self.registry.snapshot() {
            match sink.try_send(reply::SHUTDOWN_NOTICE) {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    warn!(%nick, error = %e, "Shutdown notice not delivered");
                    summary.unreachable += 1;
                }
            }
        }

        for entry in self.sessions.iter() {
            debug!(session = %entry.key(), addr = %entry.value().addr, "Closing session");
            entry.value().cancel.cancel();
            summary.closed += 1;
        }

        summary.cleared = self.registry.clear();
        summary
    }
}
