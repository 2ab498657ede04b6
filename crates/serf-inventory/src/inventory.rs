//! Ansible inventory assembly.
//!
//! Addresses are passed through exactly as the directory returns them: no
//! deduplication and no reordering. Within the manager and worker groups,
//! order follows discovery order, never probe completion order.

use std::fmt;
use std::str::FromStr;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::classify::{Role, RoleClassifier};
use crate::error::{InventoryError, Result};
use crate::member::Member;
use crate::probe::Prober;

/// Literal scope selecting every member.
pub const ALL_SCOPE: &str = "all";

/// Which members an inventory covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TeamScope {
    /// Every known member, unfiltered.
    All,
    /// Alive members tagged with this team.
    Team(String),
}

impl TeamScope {
    /// Scope for a single team.
    #[must_use]
    pub fn team(name: impl Into<String>) -> Self {
        Self::Team(name.into())
    }
}

impl FromStr for TeamScope {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(InventoryError::invalid_argument("team cannot be empty")),
            ALL_SCOPE => Ok(Self::All),
            team => Ok(Self::Team(team.to_string())),
        }
    }
}

impl fmt::Display for TeamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_SCOPE),
            Self::Team(team) => f.write_str(team),
        }
    }
}

/// One inventory group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    /// Member addresses.
    pub hosts: Vec<String>,
}

impl HostGroup {
    /// Number of hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check if the group has no hosts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl From<Vec<String>> for HostGroup {
    fn from(hosts: Vec<String>) -> Self {
        Self { hosts }
    }
}

/// Inventory grouped by swarm role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Every member; only populated for the `all` scope.
    pub all: HostGroup,
    /// Every matched team member.
    #[serde(rename = "docker_engine")]
    pub engine: HostGroup,
    /// Team members classified as managers.
    #[serde(rename = "docker_swarm_manager")]
    pub manager: HostGroup,
    /// Team members classified as workers.
    #[serde(rename = "docker_swarm_worker")]
    pub worker: HostGroup,
}

impl Inventory {
    /// Inventory for the `all` scope.
    #[must_use]
    pub fn from_all(members: &[Member]) -> Self {
        Self {
            all: addresses(members).into(),
            ..Self::default()
        }
    }

    /// Inventory for a team from members paired with their roles.
    #[must_use]
    pub fn from_classified(classified: &[(Member, Role)]) -> Self {
        let mut inventory = Self::default();
        for (member, role) in classified {
            let addr = member.addr.to_string();
            inventory.engine.hosts.push(addr.clone());
            match role {
                Role::Manager => inventory.manager.hosts.push(addr),
                Role::Worker => inventory.worker.hosts.push(addr),
            }
        }
        inventory
    }
}

fn addresses(members: &[Member]) -> Vec<String> {
    members.iter().map(|m| m.addr.to_string()).collect()
}

/// Classify members concurrently, keeping input order.
///
/// Every probe starts at once, so the pass takes roughly one probe timeout
/// regardless of member count.
pub async fn classify_all<P: Prober>(
    classifier: &RoleClassifier,
    prober: &P,
    members: Vec<Member>,
) -> Vec<(Member, Role)> {
    let probes = members.iter().map(|m| classifier.classify(prober, m));
    let roles = join_all(probes).await;
    members.into_iter().zip(roles).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn member(last: u8) -> Member {
        Member::new(format!("n{last}"), IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("all".parse::<TeamScope>().expect("parse"), TeamScope::All);
        assert_eq!(
            "ops".parse::<TeamScope>().expect("parse"),
            TeamScope::team("ops")
        );
        assert!("".parse::<TeamScope>().is_err());
        assert_eq!(TeamScope::team("ops").to_string(), "ops");
        assert_eq!(TeamScope::All.to_string(), "all");
    }

    #[test]
    fn test_from_all_populates_only_all() {
        let inventory = Inventory::from_all(&[member(1), member(2)]);
        assert_eq!(inventory.all.hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(inventory.engine.is_empty());
        assert!(inventory.manager.is_empty());
        assert!(inventory.worker.is_empty());
    }

    #[test]
    fn test_from_classified_splits_roles() {
        let inventory = Inventory::from_classified(&[
            (member(1), Role::Worker),
            (member(2), Role::Manager),
            (member(3), Role::Worker),
        ]);

        assert!(inventory.all.is_empty());
        assert_eq!(inventory.engine.hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(inventory.manager.hosts, vec!["10.0.0.2"]);
        assert_eq!(inventory.worker.hosts, vec!["10.0.0.1", "10.0.0.3"]);
    }

    #[test]
    fn test_duplicates_pass_through() {
        let inventory = Inventory::from_classified(&[
            (member(1), Role::Worker),
            (member(1), Role::Worker),
        ]);
        assert_eq!(inventory.engine.len(), 2);
        assert_eq!(inventory.worker.len(), 2);
    }

    #[test]
    fn test_inventory_wire_format() {
        let inventory = Inventory::from_classified(&[(member(7), Role::Manager)]);
        let json = serde_json::to_value(&inventory).expect("serialize");

        assert_eq!(json["all"]["hosts"], serde_json::json!([]));
        assert_eq!(json["docker_engine"]["hosts"], serde_json::json!(["10.0.0.7"]));
        assert_eq!(json["docker_swarm_manager"]["hosts"], serde_json::json!(["10.0.0.7"]));
        assert_eq!(json["docker_swarm_worker"]["hosts"], serde_json::json!([]));
    }
}
