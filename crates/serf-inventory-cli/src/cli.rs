//! Command-line argument parsing with clap.

use clap::{Parser, Subcommand, ValueEnum};
use serf_inventory::InventoryConfig;
use serf_inventory::config::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MANAGER_PATTERN, DEFAULT_MANAGER_PORT,
    DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_RPC_ADDR, DEFAULT_SERF_BINARY,
};

/// Ansible inventories for Docker Swarm from Serf cluster membership.
#[derive(Parser, Debug, Clone)]
#[command(name = "serf-inventory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// RPC address of the Serf agent.
    #[arg(short = 'a', long, env = "SERF_RPC_ADDR", default_value = DEFAULT_RPC_ADDR)]
    pub rpc_addr: String,

    /// RPC auth key of the Serf agent.
    #[arg(long, env = "SERF_RPC_AUTH", hide_env_values = true)]
    pub rpc_auth: Option<String>,

    /// Serf executable.
    #[arg(long, env = "SERF_BIN", default_value = DEFAULT_SERF_BINARY)]
    pub serf_bin: String,

    /// Port probed to detect swarm managers.
    #[arg(long, env = "SERF_INVENTORY_MANAGER_PORT", default_value_t = DEFAULT_MANAGER_PORT)]
    pub manager_port: u16,

    /// Reachability probe timeout in milliseconds.
    #[arg(
        long,
        env = "SERF_INVENTORY_PROBE_TIMEOUT_MS",
        default_value_t = DEFAULT_PROBE_TIMEOUT_MS
    )]
    pub probe_timeout_ms: u64,

    /// Serf agent connect timeout in milliseconds.
    #[arg(
        long,
        env = "SERF_INVENTORY_CONNECT_TIMEOUT_MS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT_MS
    )]
    pub connect_timeout_ms: u64,

    /// Regex searched for in the `docker_role` tag to mark managers.
    #[arg(long, env = "SERF_INVENTORY_MANAGER_PATTERN", default_value = DEFAULT_MANAGER_PATTERN)]
    pub manager_pattern: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Service configuration from the parsed arguments.
    #[must_use]
    pub fn config(&self) -> InventoryConfig {
        InventoryConfig {
            rpc_addr: self.rpc_addr.clone(),
            rpc_auth: self.rpc_auth.clone(),
            serf_binary: self.serf_bin.clone(),
            manager_port: self.manager_port,
            probe_timeout_ms: self.probe_timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
            manager_pattern: self.manager_pattern.clone(),
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    Table,
    /// JSON output for provisioning tools.
    #[default]
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the swarm inventory of a team, or `all` for every member.
    Inventory {
        /// Team name, or `all`.
        team: String,
    },

    /// List the members of a team, or `all` for every member.
    Members {
        /// Team name, or `all`.
        team: String,

        /// Probe and include each member's swarm role.
        #[arg(short, long)]
        classify: bool,
    },

    /// Show a single alive member.
    Member {
        /// Member name.
        name: String,
    },

    /// Force a failed node out of the cluster.
    ForceLeave {
        /// Node name.
        node: String,
    },
}
