//! `/quit` and `/shutdown`.

use super::Context;
use crate::error::{HandlerError, HandlerResult, Response};
use chatrelay_proto::NickExt;
use tracing::{info, warn};

pub fn quit(ctx: &mut Context<'_>) -> HandlerResult {
    info!(session = %ctx.id, nick = ?ctx.state.nick(), "Client quit");
    Ok(Response::Quit)
}

/// Admin only. Starts the shutdown protocol; the connection then waits to be
/// closed by it.
pub fn shutdown(ctx: &mut Context<'_>) -> HandlerResult {
    let nick = ctx.state.nick();
    if !nick.is_some_and(|n| n.is_admin_nick()) {
        warn!(session = %ctx.id, nick = ?nick, "Shutdown refused");
        return Err(HandlerError::PermissionDenied);
    }

    info!(session = %ctx.id, "Shutdown command received. Shutting down server...");
    ctx.supervisor.request_shutdown();
    Ok(Response::Shutdown)
}

#[cfg(test)]
mod tests {
    use crate::error::{HandlerError, Response};
    use crate::handlers::test_support::FakeSession;
    use crate::network::Supervisor;
    use crate::state::SessionIdGenerator;

    #[test]
    fn shutdown_needs_admin() {
        let supervisor = Supervisor::new();
        let ids = SessionIdGenerator::new();
        let mut anon = FakeSession::new(&ids);
        let mut bob = FakeSession::new(&ids);

        assert_eq!(
            anon.run(&supervisor, "/shutdown"),
            Err(HandlerError::PermissionDenied)
        );
        bob.run(&supervisor, "/register Admin").unwrap();
        assert_eq!(
            bob.run(&supervisor, "/shutdown"),
            Err(HandlerError::PermissionDenied)
        );
        assert!(!supervisor.is_shutting_down());
    }

    #[test]
    fn admin_requests_shutdown() {
        let supervisor = Supervisor::new();
        let ids = SessionIdGenerator::new();
        let mut admin = FakeSession::new(&ids);

        admin.run(&supervisor, "/register admin").unwrap();
        assert_eq!(
            admin.run(&supervisor, "/shutdown"),
            Ok(Response::Shutdown)
        );
        assert!(supervisor.is_shutting_down());
    }
}
