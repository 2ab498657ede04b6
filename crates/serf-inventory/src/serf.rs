//! Serf-backed membership directory.
//!
//! Drives the `serf` CLI against an agent's RPC address and parses its JSON
//! output. Filter values are regex-escaped because the agent anchors and
//! compiles them, which makes every filter an exact match.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::InventoryConfig;
use crate::directory::{DirectoryConnector, MembershipDirectory};
use crate::error::{InventoryError, Result};
use crate::member::{Member, MemberFilter, MemberStatus};

/// Environment variable the serf CLI reads its RPC auth key from.
const RPC_AUTH_ENV: &str = "SERF_RPC_AUTH";

/// Characters never passed to the serf CLI.
const FORBIDDEN_CHARS: &[char] = &['\0', '\n', '\r'];

/// `serf members -format=json` output.
#[derive(Debug, Deserialize)]
struct MemberList {
    #[serde(default)]
    members: Vec<SerfMember>,
}

#[derive(Debug, Deserialize)]
struct SerfMember {
    name: String,
    addr: String,
    #[serde(default)]
    port: u16,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
    status: String,
}

impl SerfMember {
    fn into_member(self) -> Result<Member> {
        let (addr, port) = split_addr(&self.addr, self.port).ok_or_else(|| {
            InventoryError::directory_unavailable(format!(
                "member '{}' has invalid address '{}'",
                self.name, self.addr
            ))
        })?;

        Ok(Member {
            name: self.name,
            addr,
            port,
            status: MemberStatus::from(self.status),
            tags: self.tags.unwrap_or_default(),
        })
    }
}

/// Split `ip:port` (or a bare IP) into address and port.
fn split_addr(raw: &str, fallback_port: u16) -> Option<(IpAddr, u16)> {
    if let Ok(sock) = raw.parse::<SocketAddr>() {
        return Some((sock.ip(), sock.port()));
    }
    raw.parse::<IpAddr>().ok().map(|ip| (ip, fallback_port))
}

/// Parse the JSON printed by `serf members -format=json`.
///
/// # Errors
///
/// Returns `DirectoryUnavailable` if the output is malformed.
pub fn parse_members(output: &[u8]) -> Result<Vec<Member>> {
    let list: MemberList = serde_json::from_slice(output).map_err(|e| {
        InventoryError::directory_unavailable(format!("failed to parse serf members: {e}"))
    })?;

    list.members
        .into_iter()
        .map(SerfMember::into_member)
        .collect()
}

fn validate_argument(value: &str, field: &str) -> Result<()> {
    if let Some(c) = value.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(InventoryError::invalid_argument(format!(
            "{field} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// Opens sessions against a Serf agent.
#[derive(Debug, Clone)]
pub struct SerfConnector {
    rpc_addr: String,
    rpc_auth: Option<String>,
    serf_binary: String,
    connect_timeout: Duration,
}

impl SerfConnector {
    /// Create a connector from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &InventoryConfig) -> Result<Self> {
        config.validate()?;
        if let Some(auth) = &config.rpc_auth {
            validate_argument(auth, "rpc auth key")?;
        }
        validate_argument(&config.serf_binary, "serf binary")?;

        Ok(Self {
            rpc_addr: config.rpc_addr.clone(),
            rpc_auth: config.rpc_auth.clone(),
            serf_binary: config.serf_binary.clone(),
            connect_timeout: config.connect_timeout(),
        })
    }

    /// The agent RPC address.
    #[must_use]
    pub fn rpc_addr(&self) -> &str {
        &self.rpc_addr
    }
}

impl DirectoryConnector for SerfConnector {
    type Session = SerfSession;

    async fn connect(&self) -> Result<SerfSession> {
        let attempt =
            tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.rpc_addr));
        let stream = match attempt.await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!(rpc_addr = %self.rpc_addr, error = %e, "serf agent unreachable");
                return Err(InventoryError::directory_unavailable(format!(
                    "cannot connect to serf agent at {}: {e}",
                    self.rpc_addr
                )));
            }
            Err(_) => {
                warn!(rpc_addr = %self.rpc_addr, "serf agent connect timed out");
                return Err(InventoryError::directory_unavailable(format!(
                    "connecting to serf agent at {} timed out after {}ms",
                    self.rpc_addr,
                    self.connect_timeout.as_millis()
                )));
            }
        };

        debug!(rpc_addr = %self.rpc_addr, "opened serf session");
        Ok(SerfSession {
            connector: self.clone(),
            stream,
        })
    }
}

impl SerfConnector {
    fn base_args(&self, command: &str) -> Vec<String> {
        vec![command.to_string(), format!("-rpc-addr={}", self.rpc_addr)]
    }

    fn members_args(&self, filter: &MemberFilter) -> Result<Vec<String>> {
        let mut args = self.base_args("members");
        args.push("-format=json".to_string());

        if let Some(status) = &filter.status {
            args.push(format!("-status={}", regex::escape(status.as_str())));
        }
        if let Some(name) = &filter.name {
            validate_argument(name, "member name")?;
            args.push(format!("-name={}", regex::escape(name)));
        }
        for (key, value) in &filter.tags {
            validate_argument(key, "tag key")?;
            validate_argument(value, "tag value")?;
            if key.is_empty() || key.contains('=') {
                return Err(InventoryError::invalid_argument(format!(
                    "invalid tag key '{key}'"
                )));
            }
            args.push(format!("-tag={key}={}", regex::escape(value)));
        }
        Ok(args)
    }

    /// Build a serf invocation. The auth key goes through the environment,
    /// never through argv.
    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.serf_binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match &self.rpc_auth {
            Some(auth) => cmd.env(RPC_AUTH_ENV, auth),
            None => cmd.env_remove(RPC_AUTH_ENV),
        };
        cmd
    }
}

/// A request-scoped session with a Serf agent.
///
/// Holds the connection opened by [`SerfConnector::connect`] until
/// [`MembershipDirectory::close`] shuts it down. Queries run as `serf` child
/// processes that are killed if the session's future is dropped mid-query.
#[derive(Debug)]
pub struct SerfSession {
    connector: SerfConnector,
    stream: TcpStream,
}

impl SerfSession {
    async fn run(&self, args: &[String]) -> Result<Vec<u8>> {
        let command = args.first().map_or("", String::as_str);
        debug!(binary = %self.connector.serf_binary, %command, "running serf");

        let output = self.connector.command(args).output().await.map_err(|e| {
            InventoryError::directory_unavailable(format!(
                "failed to run {}: {e}",
                self.connector.serf_binary
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InventoryError::directory_unavailable(format!(
                "serf {command} exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl MembershipDirectory for SerfSession {
    async fn list_members(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        let args = self.connector.members_args(filter)?;
        let members = parse_members(&self.run(&args).await?)?;
        debug!(count = members.len(), "listed filtered members");
        Ok(members)
    }

    async fn list_all(&self) -> Result<Vec<Member>> {
        self.list_members(&MemberFilter::any()).await
    }

    async fn request_leave(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(InventoryError::invalid_argument("node name cannot be empty"));
        }
        validate_argument(name, "node name")?;

        let mut args = self.connector.base_args("force-leave");
        args.push(name.to_string());
        self.run(&args).await?;

        info!(node = %name, "requested force-leave");
        Ok(())
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(rpc_addr = %self.connector.rpc_addr, error = %e, "serf connection already gone");
        }
        debug!(rpc_addr = %self.connector.rpc_addr, "closed serf session");
    }
}
