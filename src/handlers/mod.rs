//! Command handlers.
//!
//! One function per command, grouped by concern. Handlers validate against
//! the session state, mutate or query the registry, and return either a
//! [`Response`] for the connection to act on or a [`HandlerError`] that the
//! connection turns into a reply line. Handlers never write to their own
//! connection and never wait on another session.

mod lifecycle;
mod messaging;
mod registration;

use crate::error::{HandlerError, HandlerResult};
use crate::network::Supervisor;
use crate::state::{NickRegistry, SessionId, SessionState, Sink};
use chatrelay_proto::Command;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The session's unique ID.
    pub id: SessionId,
    /// Registration state of this session.
    pub state: &'a mut SessionState,
    /// This session's own outbound queue, as registered in the registry.
    pub sink: &'a Sink,
    /// Shared lifecycle state (registry, shutdown).
    pub supervisor: &'a Supervisor,
}

impl<'a> Context<'a> {
    pub fn new(
        id: SessionId,
        state: &'a mut SessionState,
        sink: &'a Sink,
        supervisor: &'a Supervisor,
    ) -> Self {
        Self {
            id,
            state,
            sink,
            supervisor,
        }
    }

    pub fn registry(&self) -> &'a NickRegistry {
        self.supervisor.registry()
    }
}

/// Route a parsed command to its handler.
pub fn dispatch(ctx: &mut Context<'_>, command: Command<'_>) -> HandlerResult {
    match command {
        Command::Register(nick) => registration::register(ctx, nick),
        Command::ChangeNick(nick) => registration::change_nick(ctx, nick),
        Command::Quit => lifecycle::quit(ctx),
        Command::Shutdown => lifecycle::shutdown(ctx),
        Command::DirectMessage { to, body } => messaging::direct_message(ctx, to, body),
        Command::Usage(usage) => Err(HandlerError::Usage(usage)),
        Command::Unrecognized => messaging::unrecognized(ctx),
    }
}
