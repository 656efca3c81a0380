//! Tenant-scoped entities consumed by the resolution engine.
//!
//! Every entity carries the `tenant_id` it belongs to. Readers must scope
//! lookups by tenant, and the engine re-checks the field so that a record
//! from another tenant is treated as if it did not exist.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::permission::AccessLevel;

/// Kind of resource a permission check targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Folder,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Document => f.write_str("document"),
            ResourceType::Folder => f.write_str("folder"),
        }
    }
}

/// A folder in a tenant's hierarchy. `parent_id == None` marks the tenant root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub tenant_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Soft-delete marker. Deleted folders do not exist for permission purposes.
    pub deleted_at: Option<Timestamp>,
}

impl Folder {
    /// New active folder stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        parent_id: Option<&str>,
        name: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            parent_id: parent_id.map(str::to_string),
            name: name.into(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A document. It always lives in exactly one folder, possibly the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub tenant_id: String,
    pub folder_id: String,
    pub name: String,
    pub deleted_at: Option<Timestamp>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        folder_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            folder_id: folder_id.into(),
            name: name.into(),
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// User → folder ACL entry. At most one per (tenant, folder, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderGrant {
    pub folder_id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub access_level: AccessLevel,
    /// Propagates to descendants that have no nearer grant.
    pub recursive: bool,
}

impl FolderGrant {
    pub fn new(
        folder_id: impl Into<String>,
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        access_level: AccessLevel,
        recursive: bool,
    ) -> Self {
        Self {
            folder_id: folder_id.into(),
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            access_level,
            recursive,
        }
    }
}

/// User → document ACL entry. At most one per (tenant, document, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGrant {
    pub document_id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub access_level: AccessLevel,
    pub expires_at: Option<Timestamp>,
}

impl DocumentGrant {
    pub fn new(
        document_id: impl Into<String>,
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            access_level,
            expires_at: None,
        }
    }

    /// Set the instant after which the grant no longer applies.
    pub fn expiring_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// A grant is active until its expiry instant, exclusive.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// One step of an ancestor path.
///
/// `depth` is the distance from the folder whose path was requested: its
/// parent is depth 1, the grandparent depth 2, and so on up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorEntry {
    pub folder_id: String,
    pub folder_name: String,
    pub depth: u32,
}

impl AncestorEntry {
    pub fn new(folder_id: impl Into<String>, folder_name: impl Into<String>, depth: u32) -> Self {
        Self {
            folder_id: folder_id.into(),
            folder_name: folder_name.into(),
            depth,
        }
    }
}

/// Reject empty or blank identifiers.
pub(crate) fn require_id<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(value)
}
