//! Error types for membership queries and inventory assembly.
//!
//! Every failure surfaced by this crate originates either from the membership
//! directory or from invalid input. Unreachable nodes are not errors; they are
//! folded into role classification.

use thiserror::Error;

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Errors that can occur while querying the directory or building views.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The membership directory could not be reached or a query failed.
    #[error("directory unavailable: {reason}")]
    DirectoryUnavailable {
        /// Reason for the failure.
        reason: String,
    },

    /// A name-scoped query matched no members.
    #[error("member not found: {name}")]
    NotFound {
        /// The requested member name.
        name: String,
    },

    /// A name-scoped query matched more than one member.
    #[error("ambiguous member name '{name}': {matches} members match")]
    AmbiguousName {
        /// The requested member name.
        name: String,
        /// Number of members the directory returned.
        matches: usize,
    },

    /// Configuration values are unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A request argument can never be sent to the directory.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

impl InventoryError {
    /// Creates a `DirectoryUnavailable` error with a reason.
    #[must_use]
    pub fn directory_unavailable(reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a `NotFound` error for a member name.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an `AmbiguousName` error.
    #[must_use]
    pub fn ambiguous_name(name: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousName {
            name: name.into(),
            matches,
        }
    }

    /// Creates an `InvalidConfig` error with a message.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an `InvalidArgument` error with a message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the same request later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DirectoryUnavailable { .. })
    }

    /// Returns `true` if this error indicates a configuration problem.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Returns `true` if the request named something the directory does not
    /// resolve to exactly one member.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::AmbiguousName { .. })
    }
}

impl From<std::io::Error> for InventoryError {
    fn from(err: std::io::Error) -> Self {
        Self::directory_unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_unavailable_display() {
        let err = InventoryError::directory_unavailable("connection refused");
        assert_eq!(err.to_string(), "directory unavailable: connection refused");
    }

    #[test]
    fn test_not_found_display() {
        let err = InventoryError::not_found("node-7");
        assert_eq!(err.to_string(), "member not found: node-7");
    }

    #[test]
    fn test_ambiguous_name_display() {
        let err = InventoryError::ambiguous_name("node-7", 2);
        assert_eq!(
            err.to_string(),
            "ambiguous member name 'node-7': 2 members match"
        );
    }

    #[test]
    fn test_invalid_config_display() {
        let err = InventoryError::invalid_config("probe timeout must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration: probe timeout must be positive"
        );
    }

    #[test]
    fn test_io_error_maps_to_directory_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "serf: not found");
        let err: InventoryError = io_err.into();
        assert!(matches!(err, InventoryError::DirectoryUnavailable { .. }));
        assert!(err.to_string().contains("serf: not found"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(InventoryError::directory_unavailable("x").is_recoverable());

        assert!(!InventoryError::not_found("x").is_recoverable());
        assert!(!InventoryError::ambiguous_name("x", 3).is_recoverable());
        assert!(!InventoryError::invalid_config("x").is_recoverable());
        assert!(!InventoryError::invalid_argument("x").is_recoverable());
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(InventoryError::invalid_config("x").is_configuration_error());
        assert!(!InventoryError::directory_unavailable("x").is_configuration_error());
    }

    #[test]
    fn test_is_lookup_error() {
        assert!(InventoryError::not_found("x").is_lookup_error());
        assert!(InventoryError::ambiguous_name("x", 2).is_lookup_error());
        assert!(!InventoryError::directory_unavailable("x").is_lookup_error());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InventoryError>();
    }
}
