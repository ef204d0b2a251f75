//! Configuration file watcher for hot reload.
//!
//! Editors often emit several modify events per save; a reload is only
//! forwarded when the parsed config differs from the last one sent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::BalancerConfig;

/// Watches the config file and emits validated configs.
pub struct ConfigWatcher {
    path: PathBuf,
    current: BalancerConfig,
    update_tx: mpsc::UnboundedSender<BalancerConfig>,
}

impl ConfigWatcher {
    /// `current` is the config already in effect; identical reloads are dropped.
    pub fn new(
        path: &Path,
        current: BalancerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<BalancerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(mut self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    self.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }

    /// Load the file and forward it if it changed. Returns whether it was sent.
    fn reload(&mut self) -> bool {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                return false;
            }
        };

        if config == self.current {
            tracing::debug!("Config file touched without changes");
            return false;
        }

        tracing::info!(targets = config.pool.targets.len(), "Config reloaded");
        self.current = config.clone();
        self.update_tx.send(config).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reload_forwards_only_changes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "").unwrap();

        let (mut watcher, mut rx) = ConfigWatcher::new(file.path(), BalancerConfig::default());
        assert!(!watcher.reload());
        assert!(rx.try_recv().is_err());

        fs::write(
            file.path(),
            "[[pool.targets]]\naddress = \"http://127.0.0.1:3000\"\n",
        )
        .unwrap();
        assert!(watcher.reload());
        assert_eq!(rx.try_recv().unwrap().pool.targets.len(), 1);

        // same content again
        assert!(!watcher.reload());
    }

    #[test]
    fn test_invalid_reload_keeps_current() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "[health_check]\nperiod_secs = 0\n").unwrap();

        let (mut watcher, mut rx) = ConfigWatcher::new(file.path(), BalancerConfig::default());
        assert!(!watcher.reload());
        assert!(rx.try_recv().is_err());
    }
}
