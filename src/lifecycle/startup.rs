//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the pool from configuration
//! - Start one health monitor per target
//! - Apply reloaded configs as a membership diff
//!
//! # Design Decisions
//! - Targets are keyed by name, or by address when unnamed
//! - Each member holds its own pool entry, so targets sharing an address
//!   are retired and reweighted independently
//! - A target whose address changed under the same name is replaced
//! - Removing a target stops its monitor before anything else

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{BalancerConfig, PoolConfig, TargetConfig};
use crate::health::{HealthMonitor, HealthSettings, Probe};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{PoolError, PoolResult, ServerPool, StrategyKind, Target};

/// What a call to `Supervisor::apply` changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReloadSummary {
    pub added: usize,
    pub removed: usize,
    pub reweighted: usize,
}

struct Member {
    config: TargetConfig,
    target: Arc<Target>,
    monitor: Option<HealthMonitor>,
}

/// Owns the pool plus the monitors watching its targets.
pub struct Supervisor {
    pool: Arc<ServerPool>,
    members: HashMap<String, Member>,
    probe: Option<Arc<dyn Probe>>,
    settings: HealthSettings,
    shutdown: Shutdown,
}

impl Supervisor {
    /// An empty supervisor. With `probe = None` targets are never monitored.
    pub fn new(
        strategy: StrategyKind,
        probe: Option<Arc<dyn Probe>>,
        settings: HealthSettings,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            pool: Arc::new(ServerPool::new(strategy)),
            members: HashMap::new(),
            probe,
            settings,
            shutdown,
        }
    }

    /// Build the pool and monitors described by `config`.
    /// Must be called inside a tokio runtime when health checks are enabled.
    pub fn from_config(config: &BalancerConfig, shutdown: Shutdown) -> PoolResult<Self> {
        let hc = &config.health_check;
        let settings = HealthSettings::from(hc);
        let probe = hc
            .enabled
            .then(|| hc.probe.build(&hc.path, settings.probe_timeout));

        if probe.is_none() {
            tracing::info!("Active health checks disabled");
        }

        let mut supervisor = Self::new(config.pool.strategy, probe, settings, shutdown);
        supervisor.apply(&config.pool)?;

        tracing::info!(
            strategy = %config.pool.strategy,
            targets = supervisor.pool.len(),
            "Pool started"
        );
        Ok(supervisor)
    }

    pub fn pool(&self) -> Arc<ServerPool> {
        self.pool.clone()
    }

    pub fn monitor_count(&self) -> usize {
        self.members.values().filter(|m| m.monitor.is_some()).count()
    }

    /// Reconcile the running pool with `desired`.
    pub fn apply(&mut self, desired: &PoolConfig) -> PoolResult<ReloadSummary> {
        if desired.strategy != self.pool.strategy() {
            tracing::warn!(
                running = %self.pool.strategy(),
                requested = %desired.strategy,
                "Strategy changes require a restart, keeping the running strategy"
            );
        }

        let mut summary = ReloadSummary::default();
        let mut wanted = HashSet::new();
        let mut fresh = Vec::new();

        for target in &desired.targets {
            let key = target.key().to_string();
            if !wanted.insert(key.clone()) {
                tracing::warn!(key = %key, "Duplicate target key in config, ignoring repeat");
                continue;
            }

            match self.members.get_mut(&key) {
                Some(member) if member.config.address == target.address => {
                    if member.config.weight != target.weight {
                        self.pool.set_weight_exact(&member.target, target.weight)?;
                        member.config.weight = target.weight;
                        summary.reweighted += 1;
                    }
                }
                Some(_) => {
                    self.retire(&key)?;
                    summary.removed += 1;
                    fresh.push(target.clone());
                }
                None => fresh.push(target.clone()),
            }
        }

        let stale: Vec<String> = self
            .members
            .keys()
            .filter(|k| !wanted.contains(k.as_str()))
            .cloned()
            .collect();
        for key in stale {
            self.retire(&key)?;
            summary.removed += 1;
        }

        for config in fresh {
            self.admit(config)?;
            summary.added += 1;
        }

        if summary != ReloadSummary::default() {
            tracing::info!(
                added = summary.added,
                removed = summary.removed,
                reweighted = summary.reweighted,
                count = self.pool.len(),
                "Pool reconciled"
            );
        }
        Ok(summary)
    }

    /// Stop every monitor and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.trigger();
        for (_, member) in self.members.drain() {
            if let Some(monitor) = member.monitor {
                monitor.shutdown().await;
            }
        }
        tracing::info!("All health monitors stopped");
    }

    fn admit(&mut self, config: TargetConfig) -> PoolResult<()> {
        let mut target = Target::parse(&config.address)?.with_weight(config.weight);
        if let Some(name) = &config.name {
            target = target.with_name(name.clone());
        }

        let target = self
            .pool
            .add([target])?
            .into_iter()
            .next()
            .ok_or(PoolError::EmptyInput)?;
        let monitor = self.probe.as_ref().map(|probe| {
            HealthMonitor::spawn_with_token(
                target.clone(),
                probe.clone(),
                self.settings.clone(),
                self.shutdown.child(),
            )
        });

        self.members.insert(
            config.key().to_string(),
            Member {
                config,
                target,
                monitor,
            },
        );
        Ok(())
    }

    fn retire(&mut self, key: &str) -> PoolResult<()> {
        let Some(member) = self.members.remove(key) else {
            return Ok(());
        };
        if let Some(monitor) = &member.monitor {
            monitor.stop();
        }
        self.pool.remove_exact(&member.target)?;
        Ok(())
    }
}
