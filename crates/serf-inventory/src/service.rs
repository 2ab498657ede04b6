//! Request-level operations.
//!
//! [`InventoryService`] owns a directory connector, a prober and a
//! classifier. Each operation opens one directory session, uses it, and
//! closes it before returning, whether the operation succeeded or not.

use tracing::{debug, info, warn};

use crate::classify::RoleClassifier;
use crate::config::InventoryConfig;
use crate::directory::{DirectoryConnector, MembershipDirectory};
use crate::error::{InventoryError, Result};
use crate::inventory::{Inventory, TeamScope, classify_all};
use crate::member::{Member, MemberFilter};
use crate::probe::{Prober, TcpProber};
use crate::record::{ClassifiedRecord, MemberRecord, project, project_many};
use crate::serf::SerfConnector;

/// Builds classified views of the membership directory.
#[derive(Debug, Clone)]
pub struct InventoryService<C, P = TcpProber> {
    connector: C,
    prober: P,
    classifier: RoleClassifier,
}

impl InventoryService<SerfConnector, TcpProber> {
    /// Service backed by a Serf agent and real TCP probes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &InventoryConfig) -> Result<Self> {
        Ok(Self::new(
            SerfConnector::new(config)?,
            TcpProber::new(),
            RoleClassifier::from_config(config)?,
        ))
    }
}

impl<C, P> InventoryService<C, P>
where
    C: DirectoryConnector,
    P: Prober,
{
    /// Assemble a service from its parts.
    #[must_use]
    pub fn new(connector: C, prober: P, classifier: RoleClassifier) -> Self {
        Self {
            connector,
            prober,
            classifier,
        }
    }

    /// The directory connector.
    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// The role classifier.
    #[must_use]
    pub fn classifier(&self) -> &RoleClassifier {
        &self.classifier
    }

    /// Build the inventory for a scope.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the directory cannot be queried.
    pub async fn inventory(&self, scope: &TeamScope) -> Result<Inventory> {
        let session = self.connector.connect().await?;
        let result = self.build_inventory(&session, scope).await;
        session.close().await;

        match &result {
            Ok(inventory) => info!(
                scope = %scope,
                engine = inventory.engine.len(),
                managers = inventory.manager.len(),
                workers = inventory.worker.len(),
                all = inventory.all.len(),
                "built inventory"
            ),
            Err(e) => warn!(scope = %scope, error = %e, "inventory failed"),
        }
        result
    }

    /// Project the members of a scope.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the directory cannot be queried.
    pub async fn members(&self, scope: &TeamScope) -> Result<Vec<MemberRecord>> {
        let session = self.connector.connect().await?;
        let result = scoped_members(&session, scope).await;
        session.close().await;

        let members = result?;
        debug!(scope = %scope, count = members.len(), "projected members");
        Ok(project_many(&members))
    }

    /// Project and classify the members of a scope.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the directory cannot be queried.
    pub async fn classified_members(&self, scope: &TeamScope) -> Result<Vec<ClassifiedRecord>> {
        let session = self.connector.connect().await?;
        let result = scoped_members(&session, scope).await;
        session.close().await;

        let classified = classify_all(&self.classifier, &self.prober, result?).await;
        debug!(scope = %scope, count = classified.len(), "classified members");
        Ok(classified
            .iter()
            .map(|(member, role)| ClassifiedRecord {
                record: project(member),
                role: *role,
            })
            .collect())
    }

    /// Project the single alive member with this name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no alive member has the name, `AmbiguousName` if
    /// several do, or `DirectoryUnavailable` if the directory cannot be queried.
    pub async fn member(&self, name: &str) -> Result<MemberRecord> {
        if name.is_empty() {
            return Err(InventoryError::invalid_argument("member name cannot be empty"));
        }

        let session = self.connector.connect().await?;
        let result = session
            .list_members(&MemberFilter::alive_named(name))
            .await;
        session.close().await;

        let mut matches = result?;
        match matches.len() {
            0 => Err(InventoryError::not_found(name)),
            1 => Ok(project(&matches.remove(0))),
            n => {
                warn!(name = %name, matches = n, "member name is ambiguous");
                Err(InventoryError::ambiguous_name(name, n))
            }
        }
    }

    /// Ask the directory to force a node out of the cluster.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the request fails.
    pub async fn force_leave(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(InventoryError::invalid_argument("node name cannot be empty"));
        }

        let session = self.connector.connect().await?;
        let result = session.request_leave(name).await;
        session.close().await;
        result
    }

    async fn build_inventory(&self, session: &C::Session, scope: &TeamScope) -> Result<Inventory> {
        match scope {
            TeamScope::All => Ok(Inventory::from_all(&session.list_all().await?)),
            TeamScope::Team(team) => {
                let members = session
                    .list_members(&MemberFilter::alive_in_team(team.as_str()))
                    .await?;
                let classified = classify_all(&self.classifier, &self.prober, members).await;
                Ok(Inventory::from_classified(&classified))
            }
        }
    }
}

async fn scoped_members<D: MembershipDirectory>(
    session: &D,
    scope: &TeamScope,
) -> Result<Vec<Member>> {
    match scope {
        TeamScope::All => session.list_all().await,
        TeamScope::Team(team) => {
            session
                .list_members(&MemberFilter::alive_in_team(team.as_str()))
                .await
        }
    }
}
