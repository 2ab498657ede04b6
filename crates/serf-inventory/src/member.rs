//! Cluster members as reported by the membership directory.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Default Serf gossip port.
pub const DEFAULT_GOSSIP_PORT: u16 = 7946;

/// Tag keys this crate understands.
pub mod keys {
    /// Swarm role hint, e.g. `swarm-master-1` or `worker`.
    pub const DOCKER_ROLE: &str = "docker_role";
    /// Team the node is provisioned for.
    pub const TEAM: &str = "team";
    /// Physical or logical location.
    pub const LOCATION: &str = "location";
    /// Hypervisor hosting the node.
    pub const HYPERVISOR: &str = "hypervisor";
    /// Swarm master configuration reference.
    pub const DOCKER_MASTER_CONFIG: &str = "docker_master_config";
    /// Public IP address of the node.
    pub const PUBLIC_IP: &str = "public_ip";
    /// Expiration marker for ephemeral nodes.
    pub const NODE_EXPIRATION: &str = "node_expiration";

    /// Every recognized key.
    pub const RECOGNIZED: [&str; 7] = [
        DOCKER_ROLE,
        TEAM,
        LOCATION,
        HYPERVISOR,
        DOCKER_MASTER_CONFIG,
        PUBLIC_IP,
        NODE_EXPIRATION,
    ];
}

/// Liveness status of a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberStatus {
    /// Member is alive.
    Alive,
    /// Member is gracefully leaving.
    Leaving,
    /// Member has left.
    Left,
    /// Member is considered failed.
    Failed,
    /// Status not yet known.
    None,
    /// Status string this crate does not know about.
    Other(String),
}

impl MemberStatus {
    /// The directory's spelling of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Alive => "alive",
            Self::Leaving => "leaving",
            Self::Left => "left",
            Self::Failed => "failed",
            Self::None => "none",
            Self::Other(s) => s,
        }
    }

    /// Check if the member is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

impl From<String> for MemberStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "alive" => Self::Alive,
            "leaving" => Self::Leaving,
            "left" => Self::Left,
            "failed" => Self::Failed,
            "none" => Self::None,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for MemberStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<MemberStatus> for String {
    fn from(status: MemberStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node known to the membership directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Node name.
    pub name: String,
    /// Advertised address.
    pub addr: IpAddr,
    /// Gossip port.
    pub port: u16,
    /// Liveness status.
    pub status: MemberStatus,
    /// Raw tag map.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Member {
    /// Create an alive member with no tags on the default gossip port.
    #[must_use]
    pub fn new(name: impl Into<String>, addr: IpAddr) -> Self {
        Self {
            name: name.into(),
            addr,
            port: DEFAULT_GOSSIP_PORT,
            status: MemberStatus::Alive,
            tags: BTreeMap::new(),
        }
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the gossip port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Look up a raw tag.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Typed view over the recognized tags.
    #[must_use]
    pub fn typed_tags(&self) -> MemberTags {
        MemberTags::from_map(&self.tags)
    }
}

/// Recognized tags of a member. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTags {
    /// `docker_role` tag.
    pub docker_role: Option<String>,
    /// `team` tag.
    pub team: Option<String>,
    /// `location` tag.
    pub location: Option<String>,
    /// `hypervisor` tag.
    pub hypervisor: Option<String>,
    /// `docker_master_config` tag.
    pub docker_master_config: Option<String>,
    /// `public_ip` tag.
    pub public_ip: Option<String>,
    /// `node_expiration` tag.
    pub node_expiration: Option<String>,
}

impl MemberTags {
    /// Extract recognized keys from a raw tag map.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned();
        Self {
            docker_role: get(keys::DOCKER_ROLE),
            team: get(keys::TEAM),
            location: get(keys::LOCATION),
            hypervisor: get(keys::HYPERVISOR),
            docker_master_config: get(keys::DOCKER_MASTER_CONFIG),
            public_ip: get(keys::PUBLIC_IP),
            node_expiration: get(keys::NODE_EXPIRATION),
        }
    }
}

/// Filter for a directory query. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Exact key/value tag matches, all of which must hold.
    pub tags: BTreeMap<String, String>,
    /// Required status.
    pub status: Option<MemberStatus>,
    /// Required exact name.
    pub name: Option<String>,
}

impl MemberFilter {
    /// Filter matching every member.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Alive members of a team.
    #[must_use]
    pub fn alive_in_team(team: impl Into<String>) -> Self {
        Self::any()
            .with_tag(keys::TEAM, team)
            .with_status(MemberStatus::Alive)
    }

    /// Alive members with an exact name.
    #[must_use]
    pub fn alive_named(name: impl Into<String>) -> Self {
        Self::any()
            .with_status(MemberStatus::Alive)
            .with_name(name)
    }

    /// Require a tag value.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Require a status.
    #[must_use]
    pub fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Require a name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check whether the filter places no constraint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.status.is_none() && self.name.is_none()
    }

    /// Check whether a member satisfies the filter.
    #[must_use]
    pub fn matches(&self, member: &Member) -> bool {
        if let Some(status) = &self.status {
            if &member.status != status {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &member.name != name {
                return false;
            }
        }
        self.tags
            .iter()
            .all(|(key, value)| member.tag(key) == Some(value.as_str()))
    }
}
