//! Direct messages and lines that are not commands.

use super::Context;
use crate::error::{HandlerError, HandlerResult, Response};
use chatrelay_proto::reply;
use tracing::{info, warn};

/// Deliver `<from> says: <body>` to `to`.
///
/// The recipient is looked up once and its queue is never waited on: a
/// recipient whose session has gone, or whose queue is full because its
/// client stopped reading, counts as not found.
pub fn direct_message(ctx: &mut Context<'_>, to: &str, body: &str) -> HandlerResult {
    let Some(from) = ctx.state.nick() else {
        return Err(HandlerError::MessageBeforeRegistration);
    };
    let Some(recipient) = ctx.registry().lookup(to) else {
        info!(session = %ctx.id, %from, %to, "Failed to send message: user not found");
        return Err(HandlerError::RecipientNotFound(to.to_owned()));
    };

    if let Err(e) = recipient.try_send(reply::says(from, body)) {
        warn!(session = %ctx.id, %from, %to, error = %e, "Message not delivered");
        return Err(HandlerError::RecipientNotFound(to.to_owned()));
    }

    info!(session = %ctx.id, %from, %to, "Message delivered");
    Ok(Response::Reply(reply::MESSAGE_SENT.to_owned()))
}

/// A line with no space that is not a command.
pub fn unrecognized(ctx: &mut Context<'_>) -> HandlerResult {
    if ctx.state.is_registered() {
        Err(HandlerError::InvalidFormat)
    } else {
        Err(HandlerError::MessageBeforeRegistration)
    }
}
