//! Read-only access to the folder hierarchy and stored grants.
//!
//! The engine depends on nothing but this trait. Two implementations ship
//! with the crate: [`memory::Graph`](crate::memory::Graph) and
//! [`db::Graph`](crate::db::Graph).
//!
//! # Contract
//!
//! - Every lookup is scoped by `tenant_id`; records of other tenants are
//!   never returned.
//! - Soft-deleted folders and documents are reported as absent, and so are
//!   the grants attached to them.
//! - Expired document grants are reported as absent.
//! - `get_ancestor_path` orders entries from the nearest parent to the tenant
//!   root and excludes the folder itself. A parent reference that cannot be
//!   resolved is [`Error::FolderNotFound`](crate::Error::FolderNotFound).
//! - Failures are returned as-is; the engine does not retry.

use std::future::Future;

use crate::Result;
use crate::model::{AncestorEntry, Document, DocumentGrant, Folder, FolderGrant};

/// Read operations the permission engine requires.
pub trait ResourceGraphReader: Send + Sync {
    fn get_folder(
        &self,
        folder_id: &str,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Option<Folder>>> + Send;

    fn get_document(
        &self,
        document_id: &str,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    fn get_direct_folder_grant(
        &self,
        folder_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Option<FolderGrant>>> + Send;

    /// Non-expired grant only.
    fn get_direct_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Option<DocumentGrant>>> + Send;

    /// Ancestors of `folder_id`, nearest parent first.
    fn get_ancestor_path(
        &self,
        folder_id: &str,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Vec<AncestorEntry>>> + Send;
}
