//! Unified error handling for chatrelay.
//!
//! Two families: [`HandlerError`] for command failures a session recovers
//! from by replying, and [`ConnectionError`] for transport failures that end
//! the session.

use chatrelay_proto::{ProtocolError, Usage, reply};
use thiserror::Error;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
///
/// Every variant is answered with exactly one line to the sender and leaves
/// the session state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("missing argument for /{0}")]
    Usage(Usage),

    #[error("invalid nickname: {0:?}")]
    InvalidNickname(String),

    #[error("nickname in use: {nick}")]
    NicknameInUse { nick: String, changing: bool },

    #[error("already registered")]
    AlreadyRegistered,

    /// `/change_nick` before `/register`.
    #[error("not registered")]
    NotRegistered,

    /// A chat line before `/register`.
    #[error("message before registration")]
    MessageBeforeRegistration,

    #[error("message without recipient")]
    InvalidFormat,

    #[error("permission denied")]
    PermissionDenied,

    #[error("recipient not found: {0}")]
    RecipientNotFound(String),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::InvalidNickname(_) => "invalid_nickname",
            Self::NicknameInUse { .. } => "nickname_in_use",
            Self::AlreadyRegistered => "already_registered",
            Self::NotRegistered | Self::MessageBeforeRegistration => "not_registered",
            Self::InvalidFormat => "invalid_format",
            Self::PermissionDenied => "permission_denied",
            Self::RecipientNotFound(_) => "recipient_not_found",
        }
    }

    /// The line sent back to the client.
    pub fn reply(&self) -> &'static str {
        match self {
            Self::Usage(Usage::Register) => reply::REGISTER_USAGE,
            Self::Usage(Usage::ChangeNick) => reply::CHANGE_NICK_USAGE,
            Self::InvalidNickname(_) => reply::NICK_HAS_SPACES,
            Self::NicknameInUse { changing: false, .. } => reply::NICK_TAKEN_ON_REGISTER,
            Self::NicknameInUse { changing: true, .. } => reply::NICK_TAKEN_ON_CHANGE,
            Self::AlreadyRegistered => reply::ALREADY_REGISTERED,
            Self::NotRegistered => reply::REGISTER_FIRST,
            Self::MessageBeforeRegistration => reply::MESSAGE_REGISTER_FIRST,
            Self::InvalidFormat => reply::INVALID_FORMAT,
            Self::PermissionDenied => reply::SHUTDOWN_DENIED,
            Self::RecipientNotFound(_) => reply::USER_NOT_FOUND,
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult<T = Response> = Result<T, HandlerError>;

/// What a successful command asks of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Write this line and keep serving.
    Reply(String),
    /// Write the goodbye line and terminate.
    Quit,
    /// Write the shutdown acknowledgement and wait to be closed.
    Shutdown,
}

// ============================================================================
// Connection Errors (transport)
// ============================================================================

/// Transport failures. Fatal to the session that hit them, never to others.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,

    /// The supervisor closed the session while a write was pending.
    #[error("closed by server")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),
}

impl From<ProtocolError> for ConnectionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(io) => Self::Io(io),
            other => Self::Protocol(other),
        }
    }
}

impl ConnectionError {
    /// Peer went away without an orderly close (reset, abort, broken pipe).
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::Cancelled | Self::Protocol(_) => false,
        }
    }
}
