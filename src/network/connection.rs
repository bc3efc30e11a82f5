//! Connection - drives one client session.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//!              ┌──────────────────────────────────────────┐
//!   client ───▶│ LineTransport ──▶ Command::parse         │
//!              │                        │                 │
//!              │                        ▼                 │
//!              │   tokio::select! ◀── handlers::dispatch  │
//!              │    ▲      ▲               │              │
//!              │    │      │               ▼              │
//!              │ cancel  outbound ◀── peer Sinks          │
//!              └──────────────────────────────────────────┘
//! ```
//!
//! The loop ends on `/quit`, end of input, a transport error, or
//! cancellation by the supervisor. Cancellation also interrupts a write the
//! client is not reading, so a stalled client cannot hold up shutdown.
//! Whatever ends it, [`Connection::run`] finalizes the session: release the
//! nickname if still owned, close the stream, leave the supervisor's tracked
//! set.

use super::{CLOSE_TIMEOUT, OUTBOUND_QUEUE_LEN};
use super::supervisor::Supervisor;
use super::transport::LineTransport;
use crate::error::{ConnectionError, Response};
use crate::handlers::{self, Context};
use crate::state::{SessionId, SessionState, Sink};
use chatrelay_proto::{Command, Inbound, reply};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of one `select!` round.
enum SelectResult {
    /// The supervisor is closing this session.
    Cancelled,
    /// A line queued by another session (or the shutdown notice).
    Outgoing(Arc<str>),
    /// Next unit from the client; `None` at end of input.
    Inbound(Option<Inbound>),
}

/// Whether the loop keeps serving after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// A client connection handler.
pub struct Connection<S> {
    id: SessionId,
    addr: SocketAddr,
    transport: LineTransport<S>,
    supervisor: Arc<Supervisor>,
    sink: Sink,
    outbound: mpsc::Receiver<Arc<str>>,
    cancel: CancellationToken,
    state: SessionState,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wrap an accepted stream. `cancel` is the token the supervisor handed
    /// out when it started tracking `id`.
    pub fn new(
        id: SessionId,
        stream: S,
        addr: SocketAddr,
        max_line_len: usize,
        supervisor: Arc<Supervisor>,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, outbound) = mpsc::channel(OUTBOUND_QUEUE_LEN);
        Self {
            id,
            addr,
            transport: LineTransport::new(stream, max_line_len),
            supervisor,
            sink: Sink::new(id, tx),
            outbound,
            cancel,
            state: SessionState::default(),
        }
    }

    /// Serve the client until the session ends, then finalize it.
    #[instrument(skip(self), fields(session = %self.id, addr = %self.addr), name = "connection")]
    pub async fn run(mut self) {
        info!("Client connected");

        match self.serve().await {
            Ok(()) => {}
            Err(ConnectionError::Cancelled) => info!("Closed by server during a write"),
            Err(e) if e.is_disconnect() => info!(error = %e, "Client disconnected"),
            Err(e) => error!(error = %e, "Connection error"),
        }

        if self.cancel.is_cancelled() {
            self.drain().await;
        }
        self.finalize().await;
    }

    async fn serve(&mut self) -> Result<(), ConnectionError> {
        self.send_line(reply::WELCOME).await?;

        loop {
            let selected = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => SelectResult::Cancelled,

                // Never `None`: this connection holds its own sender.
                Some(line) = self.outbound.recv() => SelectResult::Outgoing(line),

                result = self.transport.read_line() => SelectResult::Inbound(result?),
            };

            match selected {
                SelectResult::Cancelled => {
                    info!("Closed by server");
                    return Ok(());
                }
                SelectResult::Outgoing(line) => self.send_line(&line).await?,
                SelectResult::Inbound(None) => {
                    info!("Client closed the connection");
                    return Ok(());
                }
                SelectResult::Inbound(Some(Inbound::Oversized { limit })) => {
                    warn!(limit, "Input line too long");
                    self.send_line(&reply::line_too_long(limit)).await?;
                }
                SelectResult::Inbound(Some(Inbound::Line(line))) => {
                    if self.handle_line(&line).await? == Flow::Close {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow, ConnectionError> {
        let command = Command::parse(line);
        debug!(command = command.name(), "Received command");

        let result = {
            let mut ctx = Context::new(self.id, &mut self.state, &self.sink, &self.supervisor);
            handlers::dispatch(&mut ctx, command)
        };

        match result {
            Ok(Response::Reply(text)) => {
                self.send_line(&text).await?;
                Ok(Flow::Continue)
            }
            Ok(Response::Quit) => {
                self.send_line(reply::GOODBYE).await?;
                Ok(Flow::Close)
            }
            Ok(Response::Shutdown) => {
                self.send_line(reply::SHUTTING_DOWN).await?;
                // The shutdown protocol notifies and then cancels this session too.
                self.cancel.cancelled().await;
                Ok(Flow::Close)
            }
            Err(e) => {
                debug!(code = e.error_code(), error = %e, "Command failed");
                self.send_line(e.reply()).await?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Write one line, giving up if the session is cancelled while the
    /// client is not reading.
    async fn send_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        tokio::select! {
            biased;

            result = self.transport.write(line) => result,
            _ = self.cancel.cancelled() => Err(ConnectionError::Cancelled),
        }
    }

    /// Write out what is already queued (the shutdown notice included) and
    /// refuse anything new. Bounded by [`CLOSE_TIMEOUT`].
    async fn drain(&mut self) {
        self.outbound.close();
        let outbound = &mut self.outbound;
        let transport = &mut self.transport;

        let drained = timeout(CLOSE_TIMEOUT, async {
            while let Some(line) = outbound.recv().await {
                transport.write(&line).await?;
            }
            Ok::<_, ConnectionError>(())
        })
        .await;

        match drained {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Queued lines not delivered"),
            Err(_) => warn!(timeout = ?CLOSE_TIMEOUT, "Client not reading, dropping queued lines"),
        }
    }

    async fn finalize(&mut self) {
        if let Some(nick) = self.state.terminate() {
            if self.supervisor.registry().remove_if_owned_by(&nick, self.id) {
                info!(%nick, "Nickname released");
            } else {
                debug!(%nick, "Nickname already released");
            }
        }

        match timeout(CLOSE_TIMEOUT, self.transport.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Error while closing connection"),
            Err(_) => debug!("Close timed out, dropping connection"),
        }

        self.supervisor.untrack(self.id);
        info!("Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionIdGenerator;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf, duplex};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    struct Peer {
        lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl Peer {
        async fn send(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
        }

        async fn recv(&mut self) -> Option<String> {
            self.lines.next_line().await.unwrap()
        }

        async fn skip_welcome(&mut self) {
            for _ in reply::WELCOME.lines() {
                self.recv().await.unwrap();
            }
        }
    }

    fn connect(
        supervisor: &Arc<Supervisor>,
        ids: &SessionIdGenerator,
        max_line_len: usize,
    ) -> (Peer, JoinHandle<()>) {
        connect_with_pipe(supervisor, ids, max_line_len, 4096)
    }

    fn connect_with_pipe(
        supervisor: &Arc<Supervisor>,
        ids: &SessionIdGenerator,
        max_line_len: usize,
        pipe_capacity: usize,
    ) -> (Peer, JoinHandle<()>) {
        let (client, server) = duplex(pipe_capacity);
        let id = ids.next();
        let addr = "127.0.0.1:40000".parse().unwrap();
        let cancel = supervisor.track(id, addr);
        let conn = Connection::new(id, server, addr, max_line_len, Arc::clone(supervisor), cancel);
        let task = tokio::spawn(conn.run());

        let (reader, writer) = tokio::io::split(client);
        let peer = Peer {
            lines: BufReader::new(reader).lines(),
            writer,
        };
        (peer, task)
    }

    #[tokio::test]
    async fn welcome_then_register() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, _task) = connect(&supervisor, &ids, 1024);

        assert_eq!(alice.recv().await.as_deref(), Some("Welcome to the chat!"));
        for _ in 1..reply::WELCOME.lines().count() {
            alice.recv().await.unwrap();
        }
        alice.send("/register alice").await;
        assert_eq!(
            alice.recv().await.as_deref(),
            Some("You are registered as alice")
        );
    }

    #[tokio::test]
    async fn quit_releases_nickname_and_untracks() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, task) = connect(&supervisor, &ids, 1024);

        alice.skip_welcome().await;
        alice.send("/register alice").await;
        alice.recv().await.unwrap();
        alice.send("/quit").await;
        assert_eq!(alice.recv().await.as_deref(), Some("Goodbye!"));
        assert_eq!(alice.recv().await, None);

        task.await.unwrap();
        assert!(supervisor.registry().is_empty());
        assert_eq!(supervisor.tracked_count(), 0);
    }

    #[tokio::test]
    async fn end_of_input_finalizes() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, task) = connect(&supervisor, &ids, 1024);

        alice.skip_welcome().await;
        alice.send("/register alice").await;
        alice.recv().await.unwrap();
        drop(alice);

        task.await.unwrap();
        assert!(!supervisor.registry().contains("alice"));
        assert_eq!(supervisor.tracked_count(), 0);
    }

    #[tokio::test]
    async fn peers_exchange_messages() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, _a) = connect(&supervisor, &ids, 1024);
        let (mut bob, _b) = connect(&supervisor, &ids, 1024);

        alice.skip_welcome().await;
        bob.skip_welcome().await;
        alice.send("/register alice").await;
        alice.recv().await.unwrap();
        bob.send("/register bob").await;
        bob.recv().await.unwrap();

        alice.send("bob hi there").await;
        assert_eq!(
            alice.recv().await.as_deref(),
            Some("Message sent successfully.")
        );
        assert_eq!(bob.recv().await.as_deref(), Some("alice says: hi there"));
    }

    #[tokio::test]
    async fn oversized_line_keeps_session() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, _task) = connect(&supervisor, &ids, 32);

        alice.skip_welcome().await;
        alice.send(&"x".repeat(100)).await;
        assert_eq!(
            alice.recv().await.as_deref(),
            Some("Line too long (max 32 bytes).")
        );
        alice.send("/register alice").await;
        assert_eq!(
            alice.recv().await.as_deref(),
            Some("You are registered as alice")
        );
    }

    #[tokio::test]
    async fn cancellation_delivers_queued_notice_then_closes() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, task) = connect(&supervisor, &ids, 1024);

        alice.skip_welcome().await;
        alice.send("/register alice").await;
        alice.recv().await.unwrap();

        let summary = supervisor.close_all();
        assert_eq!(summary.notified, 1);
        assert_eq!(
            alice.recv().await.as_deref(),
            Some("Server is shutting down...")
        );
        assert_eq!(alice.recv().await, None);
        task.await.unwrap();
        assert_eq!(supervisor.tracked_count(), 0);
    }

    #[tokio::test]
    async fn admin_shutdown_waits_for_close() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut admin, task) = connect(&supervisor, &ids, 1024);

        admin.skip_welcome().await;
        admin.send("/register admin").await;
        admin.recv().await.unwrap();
        admin.send("/shutdown").await;
        assert_eq!(
            admin.recv().await.as_deref(),
            Some("Shutting down server...")
        );

        supervisor.shutdown_requested().await;
        assert!(!task.is_finished());
        supervisor.close_all();

        assert_eq!(
            admin.recv().await.as_deref(),
            Some("Server is shutting down...")
        );
        assert_eq!(admin.recv().await, None);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_reader_cannot_block_sender_or_shutdown() {
        let supervisor = Arc::new(Supervisor::new());
        let ids = SessionIdGenerator::new();
        let (mut alice, alice_task) = connect_with_pipe(&supervisor, &ids, 1024, 1024);
        let (mut bob, bob_task) = connect_with_pipe(&supervisor, &ids, 1024, 1024);

        alice.skip_welcome().await;
        bob.skip_welcome().await;
        alice.send("/register alice").await;
        alice.recv().await.unwrap();
        bob.send("/register bob").await;
        bob.recv().await.unwrap();

        // bob stops reading; his pipe and then his queue fill up
        let line = format!("bob {}", "x".repeat(80));
        let mut not_found = 0;
        for _ in 0..200 {
            alice.send(&line).await;
            let reply = timeout(Duration::from_secs(5), alice.recv())
                .await
                .expect("alice blocked on bob")
                .unwrap();
            if reply == "User not found" {
                not_found += 1;
            } else {
                assert_eq!(reply, "Message sent successfully.");
            }
        }
        assert!(not_found > 0);

        alice.send("/quit").await;
        assert_eq!(alice.recv().await.as_deref(), Some("Goodbye!"));
        timeout(Duration::from_secs(5), alice_task)
            .await
            .expect("alice did not finish")
            .unwrap();

        supervisor.close_all();
        timeout(Duration::from_secs(5), bob_task)
            .await
            .expect("bob survived shutdown")
            .unwrap();
        assert_eq!(supervisor.tracked_count(), 0);
        assert!(supervisor.registry().is_empty());
        drop(bob);
    }
}
