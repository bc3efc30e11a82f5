//! `/register` and `/change_nick`.

use super::Context;
use crate::error::{HandlerError, HandlerResult, Response};
use chatrelay_proto::{NickExt, reply};
use tracing::info;

/// `Unregistered` → `Registered(nick)` if the nickname is valid and free.
pub fn register(ctx: &mut Context<'_>, nick: &str) -> HandlerResult {
    if ctx.state.is_registered() {
        return Err(HandlerError::AlreadyRegistered);
    }
    if !nick.is_valid_nick() {
        return Err(HandlerError::InvalidNickname(nick.to_owned()));
    }
    if !ctx.registry().try_insert(nick, ctx.sink) {
        return Err(HandlerError::NicknameInUse {
            nick: nick.to_owned(),
            changing: false,
        });
    }

    ctx.state.register(nick.to_owned());
    info!(session = %ctx.id, %nick, "User registered");
    Ok(Response::Reply(reply::registered(nick)))
}

/// `Registered(old)` → `Registered(nick)`, swapping registry entries atomically.
pub fn change_nick(ctx: &mut Context<'_>, nick: &str) -> HandlerResult {
    let Some(old) = ctx.state.nick().map(str::to_owned) else {
        return Err(HandlerError::NotRegistered);
    };
    if !nick.is_valid_nick() {
        return Err(HandlerError::InvalidNickname(nick.to_owned()));
    }
    if !ctx.registry().rename(&old, nick, ctx.id) {
        return Err(HandlerError::NicknameInUse {
            nick: nick.to_owned(),
            changing: true,
        });
    }

    ctx.state.rename(nick.to_owned());
    info!(session = %ctx.id, %old, new = %nick, "User changed nickname");
    Ok(Response::Reply(reply::nick_changed(nick)))
}
