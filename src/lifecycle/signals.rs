//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl-C (or SIGTERM on unix), then trigger `shutdown`.
pub async fn wait_for_shutdown_signal(shutdown: &Shutdown) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT"),
                    _ = term.recv() => tracing::info!("Received SIGTERM"),
                    _ = shutdown.wait() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot install SIGTERM handler, waiting for Ctrl-C only");
                ctrl_c_or(shutdown).await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c_or(shutdown).await;

    shutdown.trigger();
}

async fn ctrl_c_or(shutdown: &Shutdown) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Ctrl-C handler failed");
            } else {
                tracing::info!("Received SIGINT");
            }
        }
        _ = shutdown.wait() => {}
    }
}
