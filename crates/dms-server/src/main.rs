//! Display manager service entry point.
//!
//! Wires the configured adapters into one `DisplayManagerService` and serves
//! it over TCP until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()                 -- TOML file or defaults
//!  └─ build_service()               -- topology, listeners, fold controller
//!  └─ start tasks
//!       ├─ pump_surface_events      (backend connect/disconnect events)
//!       ├─ run_power_worker         (ordered fold power tasks)
//!       └─ run_server               (IPC accept loop, blocks until shutdown)
//! ```
//!
//! The rendering backend is the in-process `MockRenderSurface`, seeded with
//! the panels listed under `[[mock_screens]]`.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dms_server::application::fold::PowerTask;
use dms_server::infrastructure::bootstrap;
use dms_server::infrastructure::ipc::{self, ServiceRequestHandler};
use dms_server::infrastructure::power::simulated::SimulatedPowerManager;
use dms_server::infrastructure::render_surface::mock::MockRenderSurface;
use dms_server::infrastructure::render_surface::RenderSurface;
use dms_server::infrastructure::scheduler::ChannelTaskScheduler;
use dms_server::infrastructure::storage::config::{load_config, save_config, AppConfig};

#[derive(Debug, Parser)]
#[command(name = "dms-server", version, about = "Display manager service")]
struct Cli {
    /// Configuration file; defaults to the platform config directory.
    #[arg(long, env = "DMS_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `[ipc] port`.
    #[arg(long)]
    port: Option<u16>,

    /// Overrides `[ipc] bind_address`.
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Writes the default configuration to this path and exits.
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.write_default_config {
        save_config(&AppConfig::default(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    // Level from the config file unless `RUST_LOG` is set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .init();

    info!("display manager service starting");

    let bind_ip = match cli.bind {
        Some(ip) => ip,
        None => config
            .ipc
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind_address {:?}", config.ipc.bind_address))?,
    };
    let addr = SocketAddr::new(bind_ip, cli.port.unwrap_or(config.ipc.port));

    // ── Service ───────────────────────────────────────────────────────────────
    let mock = Arc::new(MockRenderSurface::new());
    let power = Arc::new(SimulatedPowerManager::new());
    let (scheduler, queue) = ChannelTaskScheduler::<PowerTask>::new();
    let service = bootstrap::build_service(&config, mock.clone(), power, Arc::new(scheduler));

    tokio::spawn(bootstrap::run_power_worker(queue, Arc::downgrade(&service)));

    // Subscribe before plugging so no connect event is lost.
    let surface_events = mock.subscribe_connection_events();
    tokio::spawn(bootstrap::pump_surface_events(Arc::clone(&service), surface_events));
    bootstrap::plug_mock_screens(&config, &mock);

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!(foldable = service.is_foldable(), "display manager service ready.  Press Ctrl-C to exit.");

    let handler = Arc::new(ServiceRequestHandler::new(
        Arc::clone(&service),
        config.service.allow_snapshot,
    ));
    ipc::run_server(handler, addr, running).await?;

    info!("display manager service stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from(["dms-server", "--port", "25000", "--bind", "0.0.0.0"]);
        assert_eq!(cli.port, Some(25000));
        assert_eq!(cli.bind, Some("0.0.0.0".parse().unwrap()));
        assert!(cli.write_default_config.is_none());
    }

    #[test]
    fn test_cli_defaults_leave_config_values_in_charge() {
        let cli = Cli::parse_from(["dms-server"]);
        assert!(cli.port.is_none());
        assert!(cli.bind.is_none());
    }
}
