//! Swarm role classification.
//!
//! A member is a manager if its manager port answers or its `docker_role`
//! tag contains the manager pattern. Either condition alone is sufficient.
//! The probe runs once per member and its outcome is fed to
//! [`RoleClassifier::decide`], which is pure.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_MANAGER_PATTERN, DEFAULT_MANAGER_PORT, DEFAULT_PROBE_TIMEOUT_MS, InventoryConfig,
};
use crate::error::Result;
use crate::member::{Member, MemberTags};
use crate::probe::{Prober, Reachability};

static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_MANAGER_PATTERN).unwrap_or_else(|_| unreachable!()));

/// Swarm role of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Swarm manager.
    Manager,
    /// Swarm worker.
    Worker,
}

impl Role {
    /// Check if this is the manager role.
    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manager => write!(f, "manager"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

/// Classifies members into swarm roles.
#[derive(Debug, Clone)]
pub struct RoleClassifier {
    manager_port: u16,
    probe_timeout: Duration,
    pattern: Regex,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self {
            manager_port: DEFAULT_MANAGER_PORT,
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl RoleClassifier {
    /// Build a classifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager pattern does not compile.
    pub fn from_config(config: &InventoryConfig) -> Result<Self> {
        Ok(Self {
            manager_port: config.manager_port,
            probe_timeout: config.probe_timeout(),
            pattern: config.compiled_manager_pattern()?,
        })
    }

    /// Port probed on each member.
    #[must_use]
    pub const fn manager_port(&self) -> u16 {
        self.manager_port
    }

    /// Probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Address probed for a member.
    #[must_use]
    pub fn probe_target(&self, member: &Member) -> SocketAddr {
        SocketAddr::new(member.addr, self.manager_port)
    }

    /// Check whether a role tag marks a manager. A missing tag never does.
    #[must_use]
    pub fn role_tag_matches(&self, tags: &MemberTags) -> bool {
        tags.docker_role
            .as_deref()
            .is_some_and(|role| self.pattern.is_match(role))
    }

    /// Decide a role from tags and an already obtained probe outcome.
    #[must_use]
    pub fn decide(&self, tags: &MemberTags, reachability: Reachability) -> Role {
        if reachability.is_reachable() || self.role_tag_matches(tags) {
            Role::Manager
        } else {
            Role::Worker
        }
    }

    /// Probe a member once and classify it.
    pub async fn classify<P: Prober>(&self, prober: &P, member: &Member) -> Role {
        let reachability = prober
            .probe(self.probe_target(member), self.probe_timeout)
            .await;
        self.decide(&member.typed_tags(), reachability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Member;
    use proptest::prelude::*;
    use std::net::{IpAddr, Ipv4Addr};
    use test_case::test_case;

    fn tags_with_role(role: &str) -> MemberTags {
        MemberTags {
            docker_role: Some(role.to_string()),
            team: Some("x".to_string()),
            ..MemberTags::default()
        }
    }

    #[test_case(Role::Manager, "manager" ; "manager")]
    #[test_case(Role::Worker, "worker" ; "worker")]
    fn test_role_wire_name_matches_display(role: Role, expected: &str) {
        let json = serde_json::to_value(role).expect("serialize");
        assert_eq!(json, expected);
        assert_eq!(role.to_string(), expected);

        let parsed: Role = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, role);
    }

    #[test]
    fn test_tag_match_with_unreachable_probe_is_manager() {
        let classifier = RoleClassifier::default();
        let role = classifier.decide(
            &tags_with_role("swarm-master-1"),
            Reachability::Unreachable,
        );
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn test_reachable_probe_overrides_worker_tag() {
        let classifier = RoleClassifier::default();
        let role = classifier.decide(&tags_with_role("worker"), Reachability::Reachable);
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn test_worker_tag_with_unreachable_probe_is_worker() {
        let classifier = RoleClassifier::default();
        let role = classifier.decide(&tags_with_role("worker"), Reachability::Unreachable);
        assert_eq!(role, Role::Worker);
    }

    #[test]
    fn test_missing_role_tag_depends_on_probe() {
        let classifier = RoleClassifier::default();
        let tags = MemberTags::default();
        assert_eq!(classifier.decide(&tags, Reachability::Unreachable), Role::Worker);
        assert_eq!(classifier.decide(&tags, Reachability::Reachable), Role::Manager);
    }

    #[test_case("master", true ; "exact")]
    #[test_case("swarm-master-1", true ; "embedded")]
    #[test_case("masters", true ; "prefix")]
    #[test_case("Master", false ; "case sensitive")]
    #[test_case("manager", false ; "other word")]
    #[test_case("", false ; "empty")]
    fn test_default_pattern(role: &str, expected: bool) {
        let classifier = RoleClassifier::default();
        assert_eq!(classifier.role_tag_matches(&tags_with_role(role)), expected);
    }

    #[test]
    fn test_custom_pattern_from_config() {
        let config = InventoryConfig::default()
            .with_manager_pattern("^mgr-")
            .with_manager_port(12377);
        let classifier = RoleClassifier::from_config(&config).expect("classifier");

        assert!(classifier.role_tag_matches(&tags_with_role("mgr-1")));
        assert!(!classifier.role_tag_matches(&tags_with_role("swarm-master-1")));

        let member = Member::new("n", IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1)));
        assert_eq!(classifier.probe_target(&member).port(), 12377);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = InventoryConfig::default().with_manager_pattern("(");
        assert!(RoleClassifier::from_config(&config).is_err());
    }

    proptest! {
        #[test]
        fn prop_decide_is_deterministic(role in ".{0,24}", reachable in any::<bool>()) {
            let classifier = RoleClassifier::default();
            let tags = tags_with_role(&role);
            let reachability = if reachable {
                Reachability::Reachable
            } else {
                Reachability::Unreachable
            };

            let first = classifier.decide(&tags, reachability);
            let second = classifier.decide(&tags, reachability);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_manager_iff_probe_or_tag(role in "[a-z-]{0,16}", reachable in any::<bool>()) {
            let classifier = RoleClassifier::default();
            let tags = tags_with_role(&role);
            let reachability = if reachable {
                Reachability::Reachable
            } else {
                Reachability::Unreachable
            };

            let expected = reachable || role.contains("master");
            prop_assert_eq!(classifier.decide(&tags, reachability).is_manager(), expected);
        }
    }
}
