//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listening socket, spawns a [`Connection`] task per
//! client and, once shutdown is requested, runs the shutdown protocol and
//! waits for every session task to finish.

use super::connection::Connection;
use super::supervisor::Supervisor;
use crate::state::SessionIdGenerator;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, instrument, warn};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    supervisor: Arc<Supervisor>,
    ids: SessionIdGenerator,
    max_line_len: usize,
}

impl Gateway {
    /// Bind the gateway to `addr` (`host:port`).
    pub async fn bind(
        addr: &str,
        max_line_len: usize,
        supervisor: Arc<Supervisor>,
    ) -> anyhow::Result<Self> {
        let gateway = Self {
            listener: TcpListener::bind(addr).await?,
            supervisor,
            ids: SessionIdGenerator::new(),
            max_line_len,
        };
        info!(address = %gateway.local_addr()?, "Listener bound");
        Ok(gateway)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown is requested, then close every
    /// session and return once all of them have terminated.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            listener,
            supervisor,
            ids,
            max_line_len,
        } = self;
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = supervisor.shutdown_requested() => break,

                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let id = ids.next();
                        info!(session = %id, %addr, "Connection accepted");

                        let cancel = supervisor.track(id, addr);
                        let connection = Connection::new(
                            id,
                            stream,
                            addr,
                            max_line_len,
                            Arc::clone(&supervisor),
                            cancel,
                        );
                        sessions.spawn(connection.run());
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                },

                Some(joined) = sessions.join_next() => report_session_exit(joined),
            }
        }

        info!(
            sessions = supervisor.tracked_count(),
            registered = supervisor.registry().len(),
            "Stopping accept loop"
        );
        let summary = supervisor.close_all();
        info!(
            notified = summary.notified,
            unreachable = summary.unreachable,
            closed = summary.closed,
            cleared = summary.cleared,
            "Shutdown notice sent and sessions closed"
        );
        drop(listener);

        while let Some(joined) = sessions.join_next().await {
            report_session_exit(joined);
        }
        info!("All sessions terminated");
        Ok(())
    }
}

fn report_session_exit(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "Session task panicked");
        } else {
            warn!(error = %e, "Session task cancelled");
        }
    }
}
