//! Normalized member records.

use serde::{Deserialize, Serialize};

use crate::classify::Role;
use crate::member::Member;

/// Field-complete projection of a member. Absent tags become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberRecord {
    /// `docker_master_config` tag.
    pub docker_master_config: String,
    /// `docker_role` tag.
    pub docker_role: String,
    /// `hypervisor` tag.
    pub hypervisor: String,
    /// `location` tag.
    pub location: String,
    /// Member address.
    pub member_address: String,
    /// Member name.
    pub member_name: String,
    /// `public_ip` tag.
    #[serde(rename = "MemberPublicIP")]
    pub member_public_ip: String,
    /// `node_expiration` tag.
    pub node_expiration: String,
    /// Member status.
    pub status: String,
    /// `team` tag.
    pub team: String,
}

/// A record together with its classified role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// The projected record.
    #[serde(flatten)]
    pub record: MemberRecord,
    /// Classified role.
    #[serde(rename = "Role")]
    pub role: Role,
}

/// Project one member.
#[must_use]
pub fn project(member: &Member) -> MemberRecord {
    let tags = member.typed_tags();
    MemberRecord {
        docker_master_config: tags.docker_master_config.unwrap_or_default(),
        docker_role: tags.docker_role.unwrap_or_default(),
        hypervisor: tags.hypervisor.unwrap_or_default(),
        location: tags.location.unwrap_or_default(),
        member_address: member.addr.to_string(),
        member_name: member.name.clone(),
        member_public_ip: tags.public_ip.unwrap_or_default(),
        node_expiration: tags.node_expiration.unwrap_or_default(),
        status: member.status.to_string(),
        team: tags.team.unwrap_or_default(),
    }
}

/// Project members in input order.
#[must_use]
pub fn project_many(members: &[Member]) -> Vec<MemberRecord> {
    members.iter().map(project).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberStatus;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::net::{IpAddr, Ipv4Addr};

    fn member(name: &str, last: u8) -> Member {
        Member::new(name, IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
    }

    #[test]
    fn test_project_copies_recognized_tags() {
        let m = member("swarm-1", 1)
            .with_tag("docker_master_config", "cfg-a")
            .with_tag("docker_role", "swarm-master-1")
            .with_tag("hypervisor", "xen")
            .with_tag("location", "lpa")
            .with_tag("public_ip", "203.0.113.7")
            .with_tag("node_expiration", "2026-12-31")
            .with_tag("team", "ops")
            .with_status(MemberStatus::Leaving);

        let record = project(&m);
        assert_eq!(record.docker_master_config, "cfg-a");
        assert_eq!(record.docker_role, "swarm-master-1");
        assert_eq!(record.hypervisor, "xen");
        assert_eq!(record.location, "lpa");
        assert_eq!(record.member_address, "10.0.0.1");
        assert_eq!(record.member_name, "swarm-1");
        assert_eq!(record.member_public_ip, "203.0.113.7");
        assert_eq!(record.node_expiration, "2026-12-31");
        assert_eq!(record.status, "leaving");
        assert_eq!(record.team, "ops");
    }

    #[test]
    fn test_project_missing_tags_are_empty() {
        let record = project(&member("bare", 2));
        assert_eq!(record.member_name, "bare");
        assert_eq!(record.status, "alive");
        assert!(record.docker_role.is_empty());
        assert!(record.team.is_empty());
        assert!(record.member_public_ip.is_empty());
    }

    #[test]
    fn test_record_wire_names() {
        let record = project(&member("n", 3).with_tag("public_ip", "1.2.3.4"));
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["MemberName"], "n");
        assert_eq!(json["MemberAddress"], "10.0.0.3");
        assert_eq!(json["MemberPublicIP"], "1.2.3.4");
        assert_eq!(json["DockerMasterConfig"], "");
        assert_eq!(json["NodeExpiration"], "");
    }

    #[test]
    fn test_classified_record_flattens() {
        let classified = ClassifiedRecord {
            record: project(&member("n", 4)),
            role: Role::Manager,
        };
        let json = serde_json::to_value(&classified).expect("serialize");
        assert_eq!(json["MemberName"], "n");
        assert_eq!(json["Role"], "manager");
    }

    #[test]
    fn test_project_many_keeps_order_and_duplicates() {
        let members = vec![member("b", 2), member("a", 1), member("b", 2)];
        let names: Vec<_> = project_many(&members)
            .into_iter()
            .map(|r| r.member_name)
            .collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }

    proptest! {
        #[test]
        fn prop_project_is_total(
            tags in proptest::collection::btree_map("[a-z_]{1,20}", ".{0,12}", 0..10)
        ) {
            let mut m = member("p", 9);
            m.tags = tags.clone();
            let record = project(&m);

            let expect = |key: &str| tags.get(key).cloned().unwrap_or_default();
            prop_assert_eq!(record.docker_role, expect("docker_role"));
            prop_assert_eq!(record.team, expect("team"));
            prop_assert_eq!(record.location, expect("location"));
            prop_assert_eq!(record.hypervisor, expect("hypervisor"));
        }
    }

    #[test]
    fn test_unknown_tags_do_not_leak() {
        let mut tags = BTreeMap::new();
        tags.insert("rack".to_string(), "r1".to_string());
        let mut m = member("u", 5);
        m.tags = tags;

        let json = serde_json::to_value(project(&m)).expect("serialize");
        assert!(json.get("rack").is_none());
        assert!(json.get("Rack").is_none());
    }
}
