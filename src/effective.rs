//! The result of a permission evaluation.

use serde::{Deserialize, Serialize};

use crate::permission::AccessLevel;

/// Which permission source produced an [`EffectivePermission`].
///
/// Listed in precedence order: a document grant beats a direct folder grant,
/// which beats an inherited one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Document,
    FolderDirect,
    FolderInherited,
}

/// The single access level that applies to a (user, resource, tenant) triple.
///
/// Built fresh by every evaluation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermission {
    access_level: AccessLevel,
    origin: Origin,
    source_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    inheritance_path: Vec<String>,
}

impl EffectivePermission {
    /// Permission granted directly on a document.
    pub fn document(access_level: AccessLevel, document_id: impl Into<String>) -> Self {
        Self {
            access_level,
            origin: Origin::Document,
            source_resource_id: document_id.into(),
            source_resource_name: None,
            inheritance_path: Vec::new(),
        }
    }

    /// Permission granted directly on the evaluated folder.
    pub fn folder_direct(
        access_level: AccessLevel,
        folder_id: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            access_level,
            origin: Origin::FolderDirect,
            source_resource_id: folder_id.into(),
            source_resource_name: Some(folder_name.into()),
            inheritance_path: Vec::new(),
        }
    }

    /// Permission inherited from a recursive grant on an ancestor.
    ///
    /// `inheritance_path` lists folder names from the granting ancestor down
    /// to the evaluated folder, both included.
    pub fn folder_inherited(
        access_level: AccessLevel,
        ancestor_id: impl Into<String>,
        ancestor_name: impl Into<String>,
        inheritance_path: Vec<String>,
    ) -> Self {
        Self {
            access_level,
            origin: Origin::FolderInherited,
            source_resource_id: ancestor_id.into(),
            source_resource_name: Some(ancestor_name.into()),
            inheritance_path,
        }
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The folder or document the deciding grant is attached to.
    pub fn source_resource_id(&self) -> &str {
        &self.source_resource_id
    }

    /// Name of the granting folder. `None` for document grants.
    pub fn source_resource_name(&self) -> Option<&str> {
        self.source_resource_name.as_deref()
    }

    /// Empty unless the origin is [`Origin::FolderInherited`].
    pub fn inheritance_path(&self) -> &[String] {
        &self.inheritance_path
    }

    /// Whether this permission is enough for `required`.
    pub fn satisfies(&self, required: AccessLevel) -> bool {
        self.access_level.satisfies(required)
    }
}
