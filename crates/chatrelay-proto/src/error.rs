//! Error types for the line protocol.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while framing the byte stream.
///
/// Over-long lines are not errors: the codec reports them in-band as
/// [`Inbound::Oversized`](crate::line::Inbound::Oversized) so the stream
/// keeps going.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A complete line was received that is not valid UTF-8.
    #[error("invalid utf-8 in line: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
