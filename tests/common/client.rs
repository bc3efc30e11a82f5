//! Test chat client.
//!
//! Sends raw lines and asserts on the lines received back.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// Lines in the banner every connection starts with.
const WELCOME_LINES: usize = 7;

/// A test chat client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Send one line.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line, or `None` once the server closed the connection.
    pub async fn recv_line(&mut self) -> anyhow::Result<Option<String>> {
        self.recv_line_timeout(Duration::from_secs(5)).await
    }

    /// Receive one line with a timeout.
    pub async fn recv_line_timeout(&mut self, dur: Duration) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Receive one line and assert its content.
    pub async fn expect_line(&mut self, expected: &str) -> anyhow::Result<()> {
        match self.recv_line().await? {
            Some(line) if line == expected => Ok(()),
            Some(line) => anyhow::bail!("expected {expected:?}, got {line:?}"),
            None => anyhow::bail!("expected {expected:?}, got end of stream"),
        }
    }

    /// Assert that the server closes the connection.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        match self.recv_line().await? {
            None => Ok(()),
            Some(line) => anyhow::bail!("expected end of stream, got {line:?}"),
        }
    }

    /// Consume the welcome banner.
    pub async fn skip_welcome(&mut self) -> anyhow::Result<()> {
        let first = self.recv_line().await?;
        anyhow::ensure!(
            first.as_deref() == Some("Welcome to the chat!"),
            "unexpected banner start: {first:?}"
        );
        for _ in 1..WELCOME_LINES {
            self.recv_line().await?;
        }
        Ok(())
    }

    /// Register and expect success.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.send_line(&format!("/register {nick}")).await?;
        self.expect_line(&format!("You are registered as {nick}")).await
    }
}
