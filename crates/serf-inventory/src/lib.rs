//! Role-classified provisioning inventories from Serf cluster membership.
//!
//! This crate queries a Serf agent for cluster members, probes the Docker
//! Swarm manager port of each, and groups member addresses into an Ansible
//! inventory (`docker_engine`, `docker_swarm_manager`, `docker_swarm_worker`).
//!
//! ```text
//! ┌────────────────┐   connect/query   ┌──────────────┐
//! │InventoryService│──────────────────►│  Serf agent  │
//! └───────┬────────┘                   └──────────────┘
//!         │ probe :2377
//!         ▼
//!   cluster members
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use serf_inventory::{InventoryConfig, InventoryService, TeamScope};
//!
//! # async fn example() -> serf_inventory::Result<()> {
//! let service = InventoryService::from_config(&InventoryConfig::new("10.0.0.2:7373"))?;
//! let inventory = service.inventory(&TeamScope::team("ops")).await?;
//! println!("{}", serde_json::to_string_pretty(&inventory).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod directory;
pub mod error;
pub mod inventory;
pub mod member;
pub mod probe;
pub mod record;
pub mod serf;
pub mod service;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{Role, RoleClassifier};
pub use config::InventoryConfig;
pub use directory::{DirectoryConnector, MembershipDirectory};
pub use error::{InventoryError, Result};
pub use inventory::{HostGroup, Inventory, TeamScope};
pub use member::{Member, MemberFilter, MemberStatus, MemberTags};
pub use probe::{Prober, Reachability, TcpProber};
pub use record::{ClassifiedRecord, MemberRecord, project, project_many};
pub use serf::{SerfConnector, SerfSession};
pub use service::InventoryService;
