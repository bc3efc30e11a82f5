//! Line transport over a byte stream.
//!
//! Wraps one accepted stream in a [`LineCodec`] reader and writer. Callers
//! only ever see whole lines; every write is flushed before it returns.

use crate::error::ConnectionError;
use chatrelay_proto::{Inbound, LineCodec};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};

/// Line-oriented view of one connection.
pub struct LineTransport<S> {
    reader: FramedRead<ReadHalf<S>, LineCodec>,
    writer: FramedWrite<WriteHalf<S>, LineCodec>,
    closed: bool,
}

impl<S> LineTransport<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Frame `stream`, accepting lines of at most `max_line_len` bytes.
    pub fn new(stream: S, max_line_len: usize) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: FramedRead::new(read_half, LineCodec::with_max_len(max_line_len)),
            writer: FramedWrite::new(write_half, LineCodec::with_max_len(max_line_len)),
            closed: false,
        }
    }

    /// Next inbound unit, or `None` once the peer has closed its side.
    ///
    /// Cancel safe: a partially received line stays buffered.
    pub async fn read_line(&mut self) -> Result<Option<Inbound>, ConnectionError> {
        if self.closed {
            return Ok(None);
        }
        match self.reader.next().await {
            Some(Ok(inbound)) => Ok(Some(inbound)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Write one line and flush it.
    pub async fn write(&mut self, line: &str) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::Closed);
        }
        self.writer.send(line).await?;
        Ok(())
    }

    /// Flush and shut down the write side. Later calls are no-ops.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        SinkExt::<&str>::close(&mut self.writer).await?;
        Ok(())
    }
}
