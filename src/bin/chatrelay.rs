//! chatrelay - interactive client for chatrelayd.
//!
//! Prints every line the server sends and forwards every line typed on
//! stdin. Reads the server address from the same JSON file as the daemon.

use anyhow::Context;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// The subset of the daemon configuration the client needs.
#[derive(Debug, Deserialize)]
struct Endpoint {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    12345
}

impl Endpoint {
    fn load(path: &str) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {path}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let endpoint = Endpoint::load(&config_path)?;
    let address = format!("{}:{}", endpoint.host, endpoint.port);

    let stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("connecting to {address}"))?;
    info!(%address, "Connected");
    let (reader, mut writer) = stream.into_split();

    let mut server_lines = BufReader::new(reader).lines();
    let mut input_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = server_lines.next_line() => match line? {
                Some(line) => {
                    stdout.write_all(line.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
                None => {
                    info!("Server closed the connection");
                    break;
                }
            },

            line = input_lines.next_line(), if input_open => match line? {
                Some(line) => {
                    writer.write_all(line.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                }
                None => {
                    // Keep printing replies until the server hangs up.
                    debug!("End of input");
                    input_open = false;
                    writer.shutdown().await?;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}
