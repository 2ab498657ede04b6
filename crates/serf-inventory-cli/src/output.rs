//! Output formatting for CLI commands.
//!
//! JSON output is the payload provisioning tools consume; table output is for
//! people.

use std::io::Write;

use serde::Serialize;
use serf_inventory::{ClassifiedRecord, HostGroup, Inventory, MemberRecord};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay + ?Sized,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay + ?Sized,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Json)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn write_group<W: Write>(writer: &mut W, name: &str, group: &HostGroup) -> Result<(), CliError> {
    let hosts = if group.is_empty() {
        "-".to_string()
    } else {
        group.hosts.join(", ")
    };
    writeln!(writer, "{name:<22}  {:>5}  {hosts}", group.len())?;
    Ok(())
}

impl TableDisplay for Inventory {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:<22}  {:>5}  HOSTS", "GROUP", "COUNT")?;
        writeln!(writer, "{}", "─".repeat(60))?;
        write_group(writer, "all", &self.all)?;
        write_group(writer, "docker_engine", &self.engine)?;
        write_group(writer, "docker_swarm_manager", &self.manager)?;
        write_group(writer, "docker_swarm_worker", &self.worker)?;
        Ok(())
    }
}

fn write_member_header<W: Write>(writer: &mut W, with_role: bool) -> Result<(), CliError> {
    let role = if with_role { "ROLE" } else { "" };
    writeln!(
        writer,
        "{:<24}  {:<16}  {:<8}  {:<12}  {:<12}  {role}",
        "NAME", "ADDRESS", "STATUS", "TEAM", "LOCATION"
    )?;
    writeln!(writer, "{}", "─".repeat(if with_role { 90 } else { 80 }))?;
    Ok(())
}

fn write_member_row<W: Write>(
    writer: &mut W,
    record: &MemberRecord,
    role: &str,
) -> Result<(), CliError> {
    writeln!(
        writer,
        "{:<24}  {:<16}  {:<8}  {:<12}  {:<12}  {role}",
        truncate(&record.member_name, 24),
        record.member_address,
        record.status,
        truncate(&record.team, 12),
        truncate(&record.location, 12),
    )?;
    Ok(())
}

impl TableDisplay for [MemberRecord] {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No members found")?;
            return Ok(());
        }

        write_member_header(writer, false)?;
        for record in self {
            write_member_row(writer, record, "")?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} member(s)", self.len())?;
        Ok(())
    }
}

impl TableDisplay for [ClassifiedRecord] {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No members found")?;
            return Ok(());
        }

        write_member_header(writer, true)?;
        for classified in self {
            write_member_row(writer, &classified.record, &classified.role.to_string())?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} member(s)", self.len())?;
        Ok(())
    }
}

impl TableDisplay for MemberRecord {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Member: {}", self.member_name)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Address:        {}", self.member_address)?;
        writeln!(writer, "Public IP:      {}", self.member_public_ip)?;
        writeln!(writer, "Status:         {}", self.status)?;
        writeln!(writer, "Team:           {}", self.team)?;
        writeln!(writer, "Location:       {}", self.location)?;
        writeln!(writer, "Hypervisor:     {}", self.hypervisor)?;
        writeln!(writer, "Docker Role:    {}", self.docker_role)?;
        writeln!(writer, "Master Config:  {}", self.docker_master_config)?;
        writeln!(writer, "Expiration:     {}", self.node_expiration)?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
