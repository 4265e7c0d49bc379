//! `dmsctl`: command-line client for the display manager service.
//!
//! # Usage
//!
//! ```text
//! dmsctl [--addr HOST:PORT] [--timeout SECS] <COMMAND>
//!
//! dmsctl screens
//! dmsctl expand --screen 0 --at 0,0 --screen 3 --at 1920,0
//! dmsctl set-fold-mode main
//! dmsctl watch --kind display --kind fold-status
//! ```
//!
//! Results go to stdout as JSON; `watch` prints one JSON object per line.
//! Logs go to stderr and default to `warn` unless `RUST_LOG` is set.
//!
//! # Environment variable overrides
//!
//! | Variable   | Default           | Description             |
//! |------------|-------------------|-------------------------|
//! | `DMS_ADDR` | `127.0.0.1:24900` | Service address         |

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dms_ctl::application::{render, Command};
use dms_ctl::infrastructure::DmsClient;

#[derive(Debug, Parser)]
#[command(name = "dmsctl", about = "Query and control the display manager service", version)]
struct Cli {
    /// Address of the display manager service.
    #[arg(long, default_value = "127.0.0.1:24900", env = "DMS_ADDR")]
    addr: SocketAddr,

    /// Seconds to wait for each response.
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut client = DmsClient::connect(cli.addr, Duration::from_secs(cli.timeout))
        .await
        .with_context(|| format!("is the display manager service running at {}?", cli.addr))?;

    match cli.command.to_request() {
        Some(request) => {
            let response = client.request(&request).await?;
            let value = render(response)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        None => watch(&mut client, &cli.command).await?,
    }
    Ok(())
}

/// Subscribes and prints events until Ctrl-C or the service goes away.
async fn watch(client: &mut DmsClient, command: &Command) -> anyhow::Result<()> {
    let agent = Uuid::new_v4();
    client
        .subscribe(agent, command.watch_kinds())
        .await
        .context("subscription failed")?;
    info!(%agent, "watching for change events");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = client.next_event() => match event? {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => {
                    info!("service closed the connection");
                    break;
                }
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_address_points_at_local_service() {
        let cli = Cli::parse_from(["dmsctl", "screens"]);
        assert_eq!(cli.addr, "127.0.0.1:24900".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.timeout, 5);
        assert_eq!(cli.command, Command::Screens);
    }

    #[test]
    fn test_cli_addr_override() {
        let cli = Cli::parse_from(["dmsctl", "--addr", "10.0.0.5:25000", "fold-mode"]);
        assert_eq!(cli.addr.port(), 25000);
        assert_eq!(cli.command, Command::FoldMode);
    }

    #[test]
    fn test_cli_rejects_unpaired_expand_point() {
        let result = Cli::try_parse_from(["dmsctl", "expand", "--screen", "0", "--at", "zero"]);
        assert!(result.is_err());
    }
}
