//! Bounded-time TCP reachability probes.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tracing::trace;

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    /// A connection was accepted within the timeout.
    Reachable,
    /// The connection failed or timed out.
    Unreachable,
}

impl Reachability {
    /// Check if the target was reachable.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Reachable)
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable => write!(f, "Reachable"),
            Self::Unreachable => write!(f, "Unreachable"),
        }
    }
}

/// Checks whether a TCP endpoint accepts connections.
///
/// Probes never fail: any error is reported as [`Reachability::Unreachable`].
pub trait Prober: Send + Sync {
    /// Probe `addr`, giving up after `timeout`.
    fn probe(
        &self,
        addr: SocketAddr,
        timeout: Duration,
    ) -> impl Future<Output = Reachability> + Send;
}

/// Prober backed by a real TCP connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl TcpProber {
    /// Create a new prober.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Prober for TcpProber {
    async fn probe(&self, addr: SocketAddr, timeout: Duration) -> Reachability {
        let outcome = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Reachability::Reachable,
            Ok(Err(_)) | Err(_) => Reachability::Unreachable,
        };
        trace!(%addr, %outcome, "probed");
        outcome
    }
}
