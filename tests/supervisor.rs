//! End-to-end monitoring: real backends, real probes, real timers.

mod common;

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use balancer::config::{PoolConfig, TargetConfig};
use balancer::health::{HealthState, HttpProbe, Probe};
use balancer::{HealthSettings, Shutdown, StrategyKind, Supervisor};

use common::start_programmable_backend;

fn fast_settings() -> HealthSettings {
    HealthSettings::default()
        .with_period(Duration::from_millis(50))
        .with_probe_timeout(Duration::from_millis(500))
        .with_failure_threshold(2)
}

async fn wait_for_state(supervisor: &Supervisor, name: &str, wanted: HealthState) {
    let pool = supervisor.pool();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let state = pool
            .list()
            .into_iter()
            .find(|t| t.name() == Some(name))
            .map(|t| t.health_state());
        if state == Some(wanted) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "{} never reached {:?}, last seen {:?}",
            name,
            wanted,
            state
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn target(name: &str, address: String, weight: i32) -> TargetConfig {
    TargetConfig {
        address,
        name: Some(name.to_string()),
        weight,
    }
}

#[tokio::test]
async fn test_monitor_tracks_backend_health() {
    let status = Arc::new(AtomicU16::new(200));
    let backend_status = status.clone();
    let addr = start_programmable_backend(move || {
        let code = backend_status.load(Ordering::SeqCst);
        async move { (code, String::new()) }
    })
    .await;

    let probe: Arc<dyn Probe> = Arc::new(HttpProbe::new(Duration::from_millis(500)));
    let mut supervisor = Supervisor::new(
        StrategyKind::RoundRobin,
        Some(probe),
        fast_settings(),
        Shutdown::new(),
    );
    supervisor
        .apply(&PoolConfig {
            strategy: StrategyKind::RoundRobin,
            targets: vec![target("api", format!("http://{}", addr), 1)],
        })
        .unwrap();
    assert_eq!(supervisor.monitor_count(), 1);

    wait_for_state(&supervisor, "api", HealthState::Available).await;
    assert!(supervisor.pool().next_available().is_some());

    status.store(503, Ordering::SeqCst);
    wait_for_state(&supervisor, "api", HealthState::Unavailable).await;
    assert!(supervisor.pool().next_available().is_none());
    // plain selection ignores health
    assert!(supervisor.pool().next().is_some());

    status.store(200, Ordering::SeqCst);
    wait_for_state(&supervisor, "api", HealthState::Available).await;

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_reload_swaps_monitored_targets() {
    let healthy = start_programmable_backend(|| async { (200, String::new()) }).await;
    let broken = start_programmable_backend(|| async { (500, String::new()) }).await;

    let probe: Arc<dyn Probe> = Arc::new(HttpProbe::new(Duration::from_millis(500)));
    let mut supervisor = Supervisor::new(
        StrategyKind::WeightedRoundRobin,
        Some(probe),
        fast_settings(),
        Shutdown::new(),
    );

    supervisor
        .apply(&PoolConfig {
            strategy: StrategyKind::WeightedRoundRobin,
            targets: vec![
                target("good", format!("http://{}", healthy), 2),
                target("bad", format!("http://{}", broken), 1),
            ],
        })
        .unwrap();
    wait_for_state(&supervisor, "good", HealthState::Available).await;
    wait_for_state(&supervisor, "bad", HealthState::Unavailable).await;

    for _ in 0..6 {
        let picked = supervisor.pool().next_available().unwrap();
        assert_eq!(picked.name(), Some("good"));
    }

    // point "bad" at the healthy backend; it is replaced and re-probed
    let summary = supervisor
        .apply(&PoolConfig {
            strategy: StrategyKind::WeightedRoundRobin,
            targets: vec![
                target("good", format!("http://{}", healthy), 2),
                target("bad", format!("http://{}", healthy), 1),
            ],
        })
        .unwrap();
    assert_eq!(summary.added, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(supervisor.monitor_count(), 2);
    wait_for_state(&supervisor, "bad", HealthState::Available).await;

    supervisor
        .apply(&PoolConfig {
            strategy: StrategyKind::WeightedRoundRobin,
            targets: vec![target("good", format!("http://{}", healthy), 2)],
        })
        .unwrap();
    assert_eq!(supervisor.pool().len(), 1);
    assert_eq!(supervisor.monitor_count(), 1);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_token_stops_monitors() {
    let addr = start_programmable_backend(|| async { (200, String::new()) }).await;
    let shutdown = Shutdown::new();
    let probe: Arc<dyn Probe> = Arc::new(HttpProbe::new(Duration::from_millis(500)));

    let mut supervisor = Supervisor::new(
        StrategyKind::RoundRobin,
        Some(probe),
        fast_settings(),
        shutdown.clone(),
    );
    supervisor
        .apply(&PoolConfig {
            strategy: StrategyKind::RoundRobin,
            targets: vec![target("api", format!("http://{}", addr), 1)],
        })
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), supervisor.shutdown()).await;
    assert!(result.is_ok(), "monitors did not stop");
    assert!(shutdown.is_triggered());
}
