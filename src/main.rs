//! Balancer daemon.
//!
//! ```text
//!   balancer.toml ──▶ config ──▶ Supervisor ──▶ ServerPool ◀── admin API
//!        │                           │              ▲
//!        ▼                           ▼              │
//!   ConfigWatcher ── reload ──▶ apply(diff)   HealthMonitor × N ── probe ──▶ targets
//! ```
//!
//! Usage: `balancer [config.toml]` (defaults to `balancer.toml`; built-in
//! defaults are used when the file does not exist).

use std::path::PathBuf;

use tokio::net::TcpListener;

use balancer::admin::setup_admin_router;
use balancer::config::{loader::load_config, watcher::ConfigWatcher, BalancerConfig};
use balancer::lifecycle::{signals::wait_for_shutdown_signal, Shutdown, Supervisor};
use balancer::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("balancer.toml"));

    let file_exists = path.exists();
    let config = if file_exists {
        load_config(&path)?
    } else {
        BalancerConfig::default()
    };

    logging::init(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        from_file = file_exists,
        "balancer starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let mut supervisor = Supervisor::from_config(&config, shutdown.clone())?;

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(supervisor.pool(), &config.admin.api_key);
        let admin_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { admin_shutdown.wait().await })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let (watcher, mut updates) = ConfigWatcher::new(&path, config.clone());
    let _watcher = if file_exists {
        match watcher.run() {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!(error = %e, "Config hot reload unavailable");
                None
            }
        }
    } else {
        None
    };

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { wait_for_shutdown_signal(&signal_shutdown).await });

    loop {
        tokio::select! {
            Some(new_config) = updates.recv() => {
                if let Err(e) = supervisor.apply(&new_config.pool) {
                    tracing::error!(error = %e, "Failed to apply reloaded config");
                }
            }
            _ = shutdown.wait() => break,
        }
    }

    supervisor.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
