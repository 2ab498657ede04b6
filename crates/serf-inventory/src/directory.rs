//! Membership directory abstraction.
//!
//! A [`DirectoryConnector`] is built once from configuration and opens a
//! short-lived [`MembershipDirectory`] session per request. Sessions must be
//! closed with [`MembershipDirectory::close`] on every exit path; dropping a
//! session abandons any in-flight query.

use std::future::Future;

use crate::error::Result;
use crate::member::{Member, MemberFilter};

/// A per-request session with the membership directory.
pub trait MembershipDirectory: Send + Sync {
    /// List members matching the filter, in directory order.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the query fails.
    fn list_members(
        &self,
        filter: &MemberFilter,
    ) -> impl Future<Output = Result<Vec<Member>>> + Send;

    /// List every known member regardless of status or tags.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the query fails.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Member>>> + Send;

    /// Ask the directory to mark a node as departed.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the request fails.
    fn request_leave(&self, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Release the session.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Opens directory sessions.
pub trait DirectoryConnector: Send + Sync {
    /// Session type produced by this connector.
    type Session: MembershipDirectory;

    /// Open a session.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryUnavailable` if the directory cannot be reached.
    fn connect(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}
