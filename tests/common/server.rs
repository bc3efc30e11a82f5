//! Test server management.
//!
//! Spawns and manages chatrelayd instances for integration testing.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// A test server instance. Killed on drop if still running.
pub struct TestServer {
    child: Child,
    port: u16,
    _config_dir: TempDir,
}

impl TestServer {
    /// Spawn a server on `port` with default settings.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::spawn_with_buffer_size(port, 1024).await
    }

    /// Spawn a server on `port` accepting lines of at most `buffer_size` bytes.
    pub async fn spawn_with_buffer_size(port: u16, buffer_size: usize) -> anyhow::Result<Self> {
        let config_dir = tempfile::tempdir()?;
        let config_path = config_dir.path().join("config.json");
        let config_content = format!(
            r#"{{
    "host": "127.0.0.1",
    "port": {port},
    "buffer_size": {buffer_size},
    "log_level": "DEBUG"
}}"#
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_chatrelayd"))
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            port,
            _config_dir: config_dir,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(self.address()).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Create a new test client connected to this server, past the welcome banner.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        let mut client = super::client::TestClient::connect(&self.address()).await?;
        client.skip_welcome().await?;
        Ok(client)
    }

    /// Wait for the server process to exit on its own.
    pub async fn wait_for_exit(&mut self, within: Duration) -> anyhow::Result<ExitStatus> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("Server still running after {within:?}");
            }
            sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
