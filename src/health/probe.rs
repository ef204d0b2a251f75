//! Health probes.
//!
//! # Responsibilities
//! - Define the `Probe` capability used by monitors
//! - Provide default HTTP, TCP and DNS probes
//!
//! # Design Decisions
//! - A failed probe is a value (`Err(ProbeError)`), never a panic
//! - Every network probe carries its own timeout (default 5s)
//! - HTTP redirects are failures; only 2xx counts as healthy

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tokio::time;
use url::{Host, Url};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a probe considered a target unhealthy.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("resolution failed: {0}")]
    Resolve(String),

    #[error("invalid probe address: {0}")]
    InvalidAddress(String),

    #[error("request error: {0}")]
    Request(String),
}

pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ProbeError>> + Send + 'a>>;

/// Checks whether one target is reachable.
pub trait Probe: Send + Sync {
    fn check<'a>(&'a self, address: &'a Url) -> ProbeFuture<'a>;

    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F, Fut> Probe for F
where
    F: Fn(Url) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    fn check<'a>(&'a self, address: &'a Url) -> ProbeFuture<'a> {
        Box::pin(self(address.clone()))
    }
}

/// Which built-in probe to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    #[default]
    Http,
    Tcp,
    Dns,
}

impl ProbeKind {
    /// Build the probe. `path` only applies to HTTP.
    pub fn build(self, path: &str, timeout: Duration) -> Arc<dyn Probe> {
        match self {
            ProbeKind::Http => Arc::new(HttpProbe::new(timeout).with_path(path)),
            ProbeKind::Tcp => Arc::new(TcpProbe::new(timeout)),
            ProbeKind::Dns => Arc::new(DnsProbe::new(timeout)),
        }
    }
}

/// `GET` the target and expect a 2xx answer.
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            path: String::new(),
            timeout,
        }
    }

    /// Probe `address.join(path)` instead of the bare address.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    fn probe_url(&self, address: &Url) -> Result<Url, ProbeError> {
        if self.path.is_empty() {
            return Ok(address.clone());
        }
        address
            .join(&self.path)
            .map_err(|e| ProbeError::InvalidAddress(e.to_string()))
    }

    async fn get(&self, address: &Url) -> Result<(), ProbeError> {
        let url = self.probe_url(address)?;
        let request = Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header("user-agent", "balancer-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let response = match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProbeError::Connect(e.to_string())),
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

impl Probe for HttpProbe {
    fn check<'a>(&'a self, address: &'a Url) -> ProbeFuture<'a> {
        Box::pin(self.get(address))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Open (and drop) a TCP connection to the target.
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn dial(&self, address: &Url) -> Result<(), ProbeError> {
        let host = host_of(address)?;
        let port = address.port_or_known_default().ok_or_else(|| {
            ProbeError::InvalidAddress(format!("{} has no port", address))
        })?;

        let dialed = time::timeout(self.timeout, TcpStream::connect((host.as_str(), port))).await;
        match dialed {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::Connect(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

impl Probe for TcpProbe {
    fn check<'a>(&'a self, address: &'a Url) -> ProbeFuture<'a> {
        Box::pin(self.dial(address))
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}

/// Resolve the target host; healthy when at least one address comes back.
pub struct DnsProbe {
    timeout: Duration,
}

impl DnsProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn resolve(&self, address: &Url) -> Result<(), ProbeError> {
        let host = host_of(address)?;
        let port = address.port_or_known_default().unwrap_or(0);

        let resolved = time::timeout(self.timeout, lookup_host((host.as_str(), port))).await;
        match resolved {
            Ok(Ok(mut addrs)) => match addrs.next() {
                Some(_) => Ok(()),
                None => Err(ProbeError::Resolve(format!("no addresses for {}", host))),
            },
            Ok(Err(e)) => Err(ProbeError::Resolve(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

impl Probe for DnsProbe {
    fn check<'a>(&'a self, address: &'a Url) -> ProbeFuture<'a> {
        Box::pin(self.resolve(address))
    }

    fn name(&self) -> &'static str {
        "dns"
    }
}

/// Host part without IPv6 brackets, suitable for socket APIs.
fn host_of(address: &Url) -> Result<String, ProbeError> {
    match address.host() {
        Some(Host::Domain(domain)) => Ok(domain.to_string()),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        None => Err(ProbeError::InvalidAddress(format!("{} has no host", address))),
    }
}
