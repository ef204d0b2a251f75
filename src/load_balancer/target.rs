//! Target abstraction.
//!
//! # Responsibilities
//! - Represent a single backend endpoint (address + optional name)
//! - Carry the weight used by weighted round-robin
//! - Carry the availability record written by the target's health monitor

use std::sync::atomic::{AtomicI32, Ordering};
use url::Url;

use crate::health::state::{HealthState, HealthStatus};
use crate::load_balancer::error::{PoolError, PoolResult, TargetId};

/// A single backend target.
#[derive(Debug)]
pub struct Target {
    address: Url,
    name: Option<String>,
    /// Only changed through `ServerPool::set_weight`, under the pool lock.
    weight: AtomicI32,
    health: HealthStatus,
}

impl Target {
    /// Create a target with weight 1 and unknown health.
    pub fn new(address: Url) -> Self {
        Self {
            address,
            name: None,
            weight: AtomicI32::new(1),
            health: HealthStatus::new(),
        }
    }

    /// Parse an address string into a target.
    pub fn parse(address: &str) -> PoolResult<Self> {
        let url = Url::parse(address).map_err(|e| PoolError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(PoolError::InvalidAddress {
                address: address.to_string(),
                reason: "missing host".to_string(),
            });
        }
        Ok(Self::new(url))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_weight(self, weight: i32) -> Self {
        self.weight.store(weight, Ordering::Relaxed);
        self
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if configured, otherwise the address. Used for logs and metrics.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.address.as_str())
    }

    pub fn weight(&self) -> i32 {
        self.weight.load(Ordering::Relaxed)
    }

    pub(crate) fn set_weight(&self, weight: i32) {
        self.weight.store(weight, Ordering::Relaxed);
    }

    /// True once the health monitor has marked this target available.
    pub fn is_available(&self) -> bool {
        self.health.is_available()
    }

    pub fn health_state(&self) -> HealthState {
        self.health.state()
    }

    pub fn health(&self) -> &HealthStatus {
        &self.health
    }

    /// Identifier for this target: its name when set, else its address.
    pub fn id(&self) -> TargetId {
        match &self.name {
            Some(name) => TargetId::Name(name.clone()),
            None => TargetId::Address(self.address.clone()),
        }
    }

    /// Whether this target is the one `id` refers to.
    pub fn matches(&self, id: &TargetId) -> bool {
        match id {
            TargetId::Address(url) => same_address(&self.address, url),
            TargetId::Name(name) => self.name.as_deref() == Some(name.as_str()),
        }
    }
}

/// Structural address equality: scheme, host, port and path.
/// Query strings and fragments are ignored.
///
/// Ports are compared after `url` normalization, which drops the scheme's
/// default port: `http://x:80` and `http://x` are the same address, while
/// `http://x:8080` is not.
pub fn same_address(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port() == b.port()
        && a.path() == b.path()
}
