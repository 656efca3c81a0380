//! Folder permission resolution with hierarchical inheritance.
//!
//! Rules:
//! - A grant on the folder itself always applies, recursive or not.
//! - Otherwise ancestors are visited from the nearest parent to the root and
//!   the first ancestor carrying a grant decides: a recursive grant is
//!   inherited, a non-recursive one blocks everything farther up.
//! - Ancestors without a grant are skipped.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config;
use crate::effective::EffectivePermission;
use crate::error::{Error, Result};
use crate::model::{AncestorEntry, Folder, FolderGrant, require_id};
use crate::reader::ResourceGraphReader;

/// Outcome of visiting one ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// No grant here, keep walking toward the root.
    Continue,
    /// Recursive grant: inherited by the target, walk stops.
    Inherit(FolderGrant),
    /// Non-recursive grant: shadows every farther ancestor, walk stops
    /// with no permission.
    Block(FolderGrant),
}

impl Visit {
    /// Classify the grant (if any) found at an ancestor.
    pub fn of(grant: Option<FolderGrant>) -> Self {
        match grant {
            None => Visit::Continue,
            Some(grant) if grant.recursive => Visit::Inherit(grant),
            Some(grant) => Visit::Block(grant),
        }
    }

    /// Whether the walk ends at this ancestor.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, Visit::Continue)
    }
}

/// Names from `path[index]` down to the target, farthest first.
fn inheritance_path(path: &[AncestorEntry], index: usize, target: &Folder) -> Vec<String> {
    path[..=index]
        .iter()
        .rev()
        .map(|a| a.folder_name.clone())
        .chain(std::iter::once(target.name.clone()))
        .collect()
}

/// Resolves the effective permission of a user on a folder.
pub struct FolderInheritanceResolver<R> {
    reader: Arc<R>,
    max_depth: u32,
}

impl<R> Clone for FolderInheritanceResolver<R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            max_depth: self.max_depth,
        }
    }
}

impl<R: ResourceGraphReader> FolderInheritanceResolver<R> {
    /// Creates a resolver with the default depth bound.
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_config(reader, &config::Resolver::default())
    }

    pub fn with_config(reader: Arc<R>, config: &config::Resolver) -> Self {
        Self {
            reader,
            max_depth: config.max_depth,
        }
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Resolve the permission `user_id` holds on `folder_id`.
    ///
    /// # Returns
    /// - `Ok(Some(_))` with origin `FolderDirect` or `FolderInherited`
    /// - `Ok(None)` if no grant applies
    /// - `Err(Error::FolderNotFound)` if the folder, or an ancestor, does not
    ///   exist in the tenant
    pub async fn resolve_folder_permission(
        &self,
        user_id: &str,
        folder_id: &str,
        tenant_id: &str,
    ) -> Result<Option<EffectivePermission>> {
        require_id("user_id", user_id)?;
        require_id("folder_id", folder_id)?;
        require_id("tenant_id", tenant_id)?;

        let folder = self.load_folder(folder_id, tenant_id).await?;

        if let Some(grant) = self.scoped_grant(folder_id, user_id, tenant_id).await? {
            debug!(user_id, folder_id, level = %grant.access_level, "direct folder grant");
            return Ok(Some(EffectivePermission::folder_direct(
                grant.access_level,
                &folder.id,
                &folder.name,
            )));
        }

        if folder.is_root() {
            return Ok(None);
        }

        let path = self.ancestor_path(&folder, tenant_id).await?;

        for (index, ancestor) in path.iter().enumerate() {
            let grant = self
                .scoped_grant(&ancestor.folder_id, user_id, tenant_id)
                .await?;

            match Visit::of(grant) {
                Visit::Continue => continue,
                Visit::Inherit(grant) => {
                    debug!(
                        user_id,
                        folder_id,
                        source = %ancestor.folder_id,
                        level = %grant.access_level,
                        "inherited folder grant"
                    );
                    return Ok(Some(EffectivePermission::folder_inherited(
                        grant.access_level,
                        &ancestor.folder_id,
                        &ancestor.folder_name,
                        inheritance_path(&path, index, &folder),
                    )));
                }
                Visit::Block(_) => {
                    debug!(
                        user_id,
                        folder_id,
                        blocked_at = %ancestor.folder_id,
                        "non-recursive ancestor grant blocks inheritance"
                    );
                    return Ok(None);
                }
            }
        }

        Ok(None)
    }

    /// Fetch an active folder that really belongs to `tenant_id`.
    pub(crate) async fn load_folder(&self, folder_id: &str, tenant_id: &str) -> Result<Folder> {
        let folder = self
            .reader
            .get_folder(folder_id, tenant_id)
            .await?
            .ok_or_else(|| Error::FolderNotFound(folder_id.to_string()))?;

        if folder.tenant_id != tenant_id {
            warn!(
                folder_id,
                tenant_id,
                found_tenant = %folder.tenant_id,
                "reader returned a folder from another tenant"
            );
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }
        if !folder.is_active() {
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }
        Ok(folder)
    }

    /// Direct grant on `folder_id`, ignoring records of another tenant,
    /// folder or user.
    async fn scoped_grant(
        &self,
        folder_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<FolderGrant>> {
        let grant = self
            .reader
            .get_direct_folder_grant(folder_id, user_id, tenant_id)
            .await?;

        Ok(grant.filter(|g| {
            if g.tenant_id != tenant_id {
                warn!(
                    folder_id,
                    user_id,
                    tenant_id,
                    grant_tenant = %g.tenant_id,
                    "ignoring folder grant from another tenant"
                );
                return false;
            }
            if g.folder_id != folder_id || g.user_id != user_id {
                warn!(
                    folder_id,
                    user_id,
                    grant_folder = %g.folder_id,
                    grant_user = %g.user_id,
                    "ignoring folder grant issued for another folder or user"
                );
                return false;
            }
            true
        }))
    }

    /// Ancestors of `folder`, nearest first, without the folder itself.
    async fn ancestor_path(&self, folder: &Folder, tenant_id: &str) -> Result<Vec<AncestorEntry>> {
        let mut path = self.reader.get_ancestor_path(&folder.id, tenant_id).await?;
        path.retain(|a| a.folder_id != folder.id);
        path.sort_by_key(|a| a.depth);

        if path.len() > self.max_depth as usize {
            return Err(Error::Internal(format!(
                "folder {} has {} ancestors, more than the limit of {}",
                folder.id,
                path.len(),
                self.max_depth
            )));
        }
        Ok(path)
    }
}
