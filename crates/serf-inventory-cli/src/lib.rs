//! # serf-inventory-cli
//!
//! Command-line front end for `serf-inventory`.
//!
//! Provides commands for:
//! - Printing the Ansible swarm inventory of a team
//! - Listing team members, optionally with their swarm role
//! - Looking up a single member
//! - Forcing a failed node out of the cluster
//!
//! ```text
//! ┌────────────────┐     serf CLI      ┌──────────────┐
//! │ serf-inventory │──────────────────►│  Serf agent  │
//! └────────────────┘   (RPC address)   └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use commands::InventoryCommand;
pub use error::CliError;
pub use output::OutputFormat;
