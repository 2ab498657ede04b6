//! CLI error types.

use std::fmt;

use serf_inventory::InventoryError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The inventory service failed.
    Inventory(InventoryError),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inventory(e) => write!(f, "{e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inventory(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Format(_) => None,
        }
    }
}

impl From<InventoryError> for CliError {
    fn from(err: InventoryError) -> Self {
        Self::Inventory(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_inventory() {
        let err = CliError::from(InventoryError::not_found("node-9"));
        assert_eq!(err.to_string(), "member not found: node-9");
    }

    #[test]
    fn cli_error_display_format() {
        let err = CliError::Format("bad utf-8".into());
        assert_eq!(err.to_string(), "format error: bad utf-8");
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
