//! In-memory fakes for the directory and the prober.
//!
//! Compiled for this crate's tests and behind the `testing` feature, for
//! front ends that exercise the service without a Serf agent.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::directory::{DirectoryConnector, MembershipDirectory};
use crate::error::{InventoryError, Result};
use crate::member::{Member, MemberFilter, MemberStatus};
use crate::probe::{Prober, Reachability};

#[derive(Debug, Default)]
struct DirectoryState {
    members: RwLock<Vec<Member>>,
    fail_connect: AtomicBool,
    fail_queries: AtomicBool,
    opened: AtomicUsize,
    closed: AtomicUsize,
    released: AtomicUsize,
    leave_requests: Mutex<Vec<String>>,
}

/// In-memory membership directory.
///
/// Cloning shares state, so a test can keep a handle while the service owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeDirectory {
    state: Arc<DirectoryState>,
}

impl FakeDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, kept in insertion order.
    #[must_use]
    pub fn with_member(self, member: Member) -> Self {
        self.state.members.write().push(member);
        self
    }

    /// Make every `connect` fail.
    pub fn fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make every query on open sessions fail.
    pub fn fail_queries(&self, fail: bool) {
        self.state.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of sessions opened.
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of sessions closed.
    #[must_use]
    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Number of sessions dropped, whether closed or abandoned.
    #[must_use]
    pub fn sessions_released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    /// Names passed to `request_leave`, in call order.
    #[must_use]
    pub fn leave_requests(&self) -> Vec<String> {
        self.state.leave_requests.lock().clone()
    }
}

impl DirectoryConnector for FakeDirectory {
    type Session = FakeSession;

    async fn connect(&self) -> Result<FakeSession> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(InventoryError::directory_unavailable("fake directory offline"));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

/// Session on a [`FakeDirectory`].
#[derive(Debug)]
pub struct FakeSession {
    state: Arc<DirectoryState>,
}

impl FakeSession {
    fn check_available(&self) -> Result<()> {
        if self.state.fail_queries.load(Ordering::SeqCst) {
            return Err(InventoryError::directory_unavailable("fake query failure"));
        }
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl MembershipDirectory for FakeSession {
    async fn list_members(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        self.check_available()?;
        Ok(self
            .state
            .members
            .read()
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Member>> {
        self.check_available()?;
        Ok(self.state.members.read().clone())
    }

    async fn request_leave(&self, name: &str) -> Result<()> {
        self.check_available()?;
        self.state.leave_requests.lock().push(name.to_string());
        for member in self.state.members.write().iter_mut() {
            if member.name == name {
                member.status = MemberStatus::Left;
            }
        }
        Ok(())
    }

    async fn close(self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Prober with scripted outcomes.
///
/// Addresses are unreachable unless marked otherwise. A per-host delay lets
/// tests make probes finish out of order.
#[derive(Debug, Clone, Default)]
pub struct FakeProber {
    reachable: Arc<RwLock<HashSet<SocketAddr>>>,
    delays: Arc<RwLock<HashMap<IpAddr, Duration>>>,
    probed: Arc<Mutex<Vec<SocketAddr>>>,
}

impl FakeProber {
    /// Create a prober where everything is unreachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an endpoint reachable.
    #[must_use]
    pub fn with_reachable(self, addr: SocketAddr) -> Self {
        self.reachable.write().insert(addr);
        self
    }

    /// Delay probes of a host.
    #[must_use]
    pub fn with_delay(self, host: IpAddr, delay: Duration) -> Self {
        self.delays.write().insert(host, delay);
        self
    }

    /// Endpoints probed so far, in call order.
    #[must_use]
    pub fn probed(&self) -> Vec<SocketAddr> {
        self.probed.lock().clone()
    }
}

impl Prober for FakeProber {
    async fn probe(&self, addr: SocketAddr, timeout: Duration) -> Reachability {
        self.probed.lock().push(addr);
        let delay = self.delays.read().get(&addr.ip()).copied();
        let reachable = self.reachable.read().contains(&addr);

        if let Some(delay) = delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return Reachability::Unreachable;
            }
            tokio::time::sleep(delay).await;
        }

        if reachable {
            Reachability::Reachable
        } else {
            Reachability::Unreachable
        }
    }
}
