//! Subcommand execution against an inventory service.

use std::io::Write;

use serf_inventory::{DirectoryConnector, InventoryService, Prober, TeamScope};
use tracing::debug;

use crate::cli::Commands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Runs subcommands and writes their output.
pub struct InventoryCommand<C, P> {
    service: InventoryService<C, P>,
}

impl<C, P> InventoryCommand<C, P>
where
    C: DirectoryConnector,
    P: Prober,
{
    /// Create a command runner over a service.
    #[must_use]
    pub fn new(service: InventoryService<C, P>) -> Self {
        Self { service }
    }

    /// Execute a subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the service fails or output cannot be written.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &Commands,
    ) -> Result<(), CliError> {
        match command {
            Commands::Inventory { team } => {
                let scope: TeamScope = team.parse()?;
                debug!(%scope, "building inventory");
                let inventory = self.service.inventory(&scope).await?;
                format.write(writer, &inventory)?;
            }
            Commands::Members {
                team,
                classify: false,
            } => {
                let scope: TeamScope = team.parse()?;
                let records = self.service.members(&scope).await?;
                format.write(writer, records.as_slice())?;
            }
            Commands::Members {
                team,
                classify: true,
            } => {
                let scope: TeamScope = team.parse()?;
                let records = self.service.classified_members(&scope).await?;
                format.write(writer, records.as_slice())?;
            }
            Commands::Member { name } => {
                let record = self.service.member(name).await?;
                format.write(writer, &record)?;
            }
            Commands::ForceLeave { node } => {
                self.service.force_leave(node).await?;
                let msg = Message::success(format!("force-leave sent for {node}"));
                format.write(writer, &msg)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use serf_inventory::member::keys;
    use serf_inventory::testing::{FakeDirectory, FakeProber};
    use serf_inventory::{InventoryError, Member, RoleClassifier};

    use super::*;
    use crate::cli::Format;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    fn directory() -> FakeDirectory {
        FakeDirectory::new()
            .with_member(
                Member::new("swarm-1", ip(1))
                    .with_tag(keys::TEAM, "ops")
                    .with_tag(keys::DOCKER_ROLE, "swarm-master-1"),
            )
            .with_member(Member::new("swarm-2", ip(2)).with_tag(keys::TEAM, "ops"))
            .with_member(Member::new("web-1", ip(3)).with_tag(keys::TEAM, "web"))
    }

    fn command(
        dir: FakeDirectory,
        prober: FakeProber,
    ) -> InventoryCommand<FakeDirectory, FakeProber> {
        InventoryCommand::new(InventoryService::new(dir, prober, RoleClassifier::default()))
    }

    async fn run_json(
        cmd: &InventoryCommand<FakeDirectory, FakeProber>,
        command: &Commands,
    ) -> Result<serde_json::Value, CliError> {
        let mut out = Vec::new();
        cmd.execute(&mut out, &OutputFormat::new(Format::Json), command)
            .await?;
        Ok(serde_json::from_slice(&out).expect("valid json"))
    }

    #[tokio::test]
    async fn inventory_for_team() {
        let prober = FakeProber::new().with_reachable(SocketAddr::new(ip(2), 2377));
        let cmd = command(directory(), prober);

        let json = run_json(&cmd, &Commands::Inventory { team: "ops".into() })
            .await
            .expect("inventory");

        let both = serde_json::json!(["10.0.0.1", "10.0.0.2"]);
        assert_eq!(json["docker_engine"]["hosts"], both);
        assert_eq!(json["docker_swarm_manager"]["hosts"], both);
        assert_eq!(json["docker_swarm_worker"]["hosts"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn inventory_for_all() {
        let cmd = command(directory(), FakeProber::new());

        let json = run_json(&cmd, &Commands::Inventory { team: "all".into() })
            .await
            .expect("inventory");

        assert_eq!(
            json["all"]["hosts"],
            serde_json::json!(["10.0.0.1", "10.0.0.2", "10.0.0.3"])
        );
        assert_eq!(cmd.service.connector().sessions_opened(), 1);
    }

    #[tokio::test]
    async fn members_with_roles() {
        let cmd = command(directory(), FakeProber::new());

        let json = run_json(
            &cmd,
            &Commands::Members {
                team: "ops".into(),
                classify: true,
            },
        )
        .await
        .expect("members");

        assert_eq!(json[0]["MemberName"], "swarm-1");
        assert_eq!(json[0]["Role"], "manager");
        assert_eq!(json[1]["Role"], "worker");
    }

    #[tokio::test]
    async fn members_without_roles() {
        let cmd = command(directory(), FakeProber::new());

        let json = run_json(
            &cmd,
            &Commands::Members {
                team: "web".into(),
                classify: false,
            },
        )
        .await
        .expect("members");

        assert_eq!(json.as_array().map(Vec::len), Some(1));
        assert!(json[0].get("Role").is_none());
    }

    #[tokio::test]
    async fn missing_member_is_not_found() {
        let cmd = command(directory(), FakeProber::new());

        let err = run_json(&cmd, &Commands::Member { name: "nope".into() })
            .await
            .expect_err("should fail");

        assert!(matches!(err, CliError::Inventory(InventoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn empty_team_is_rejected_without_connecting() {
        let dir = directory();
        let cmd = command(dir.clone(), FakeProber::new());

        let err = run_json(&cmd, &Commands::Inventory { team: String::new() })
            .await
            .expect_err("should fail");

        assert!(matches!(err, CliError::Inventory(InventoryError::InvalidArgument { .. })));
        assert_eq!(dir.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn force_leave_reports_success() {
        let dir = directory();
        let cmd = command(dir.clone(), FakeProber::new());

        let mut out = Vec::new();
        cmd.execute(
            &mut out,
            &OutputFormat::new(Format::Table),
            &Commands::ForceLeave {
                node: "web-1".into(),
            },
        )
        .await
        .expect("force-leave");

        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("✓ force-leave sent for web-1"));
        assert_eq!(dir.leave_requests(), vec!["web-1".to_string()]);
    }
}
