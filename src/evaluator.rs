//! Effective permission evaluation.
//!
//! Precedence, highest first:
//! 1. Document ACL: a direct, non-expired grant on the document.
//! 2. Direct folder ACL: a grant on the containing (or evaluated) folder.
//! 3. Inherited folder ACL: a recursive grant on the nearest decisive ancestor.
//!
//! A higher source wins even when it grants a lower level.

use std::sync::Arc;

use jiff::Timestamp;
use tracing::{debug, warn};

use crate::config;
use crate::effective::EffectivePermission;
use crate::error::{Error, Result};
use crate::model::{DocumentGrant, ResourceType, require_id};
use crate::permission::{AccessLevel, Level, Permission};
use crate::reader::ResourceGraphReader;
use crate::resolver::FolderInheritanceResolver;

/// Single entry point for permission decisions.
///
/// Stateless apart from the shared reader, so one evaluator can serve any
/// number of concurrent tasks.
pub struct PermissionEvaluator<R> {
    folders: FolderInheritanceResolver<R>,
}

impl<R> Clone for PermissionEvaluator<R> {
    fn clone(&self) -> Self {
        Self {
            folders: self.folders.clone(),
        }
    }
}

impl<R: ResourceGraphReader> PermissionEvaluator<R> {
    /// Creates an evaluator with default resolver settings.
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_config(reader, &config::Resolver::default())
    }

    pub fn with_config(reader: Arc<R>, config: &config::Resolver) -> Self {
        Self {
            folders: FolderInheritanceResolver::with_config(reader, config),
        }
    }

    /// The folder resolver this evaluator delegates to.
    pub fn folder_resolver(&self) -> &FolderInheritanceResolver<R> {
        &self.folders
    }

    /// Effective permission of `user_id` on a document.
    ///
    /// A document grant always wins. Without one, the document's folder is
    /// evaluated instead.
    pub async fn evaluate_for_document(
        &self,
        user_id: &str,
        document_id: &str,
        tenant_id: &str,
    ) -> Result<Option<EffectivePermission>> {
        require_id("user_id", user_id)?;
        require_id("document_id", document_id)?;
        require_id("tenant_id", tenant_id)?;

        let reader = self.folders.reader();
        let document = reader
            .get_document(document_id, tenant_id)
            .await?
            .filter(|d| d.is_active())
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;

        if document.tenant_id != tenant_id {
            warn!(
                document_id,
                tenant_id,
                found_tenant = %document.tenant_id,
                "reader returned a document from another tenant"
            );
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }

        let grant = reader
            .get_direct_document_grant(document_id, user_id, tenant_id)
            .await?
            .filter(|g| usable(g, document_id, user_id, tenant_id, Timestamp::now()));

        if let Some(grant) = grant {
            debug!(user_id, document_id, level = %grant.access_level, "document grant");
            return Ok(Some(EffectivePermission::document(
                grant.access_level,
                document_id,
            )));
        }

        self.evaluate_for_folder(user_id, &document.folder_id, tenant_id)
            .await
    }

    /// Effective permission of `user_id` on a folder.
    pub async fn evaluate_for_folder(
        &self,
        user_id: &str,
        folder_id: &str,
        tenant_id: &str,
    ) -> Result<Option<EffectivePermission>> {
        self.folders
            .resolve_folder_permission(user_id, folder_id, tenant_id)
            .await
    }

    /// Effective permission on either kind of resource.
    pub async fn evaluate(
        &self,
        user_id: &str,
        resource_id: &str,
        resource_type: ResourceType,
        tenant_id: &str,
    ) -> Result<Option<EffectivePermission>> {
        match resource_type {
            ResourceType::Document => {
                self.evaluate_for_document(user_id, resource_id, tenant_id)
                    .await
            }
            ResourceType::Folder => {
                self.evaluate_for_folder(user_id, resource_id, tenant_id)
                    .await
            }
        }
    }

    /// Whether `user_id` holds at least `required` on the resource.
    ///
    /// Denial is `Ok(false)`. Errors are reserved for invalid arguments,
    /// missing resources and reader failures.
    pub async fn has_access(
        &self,
        user_id: &str,
        resource_id: &str,
        resource_type: ResourceType,
        required: AccessLevel,
        tenant_id: &str,
    ) -> Result<bool> {
        let granted = self
            .evaluate(user_id, resource_id, resource_type, tenant_id)
            .await?;
        Ok(granted.is_some_and(|p| p.satisfies(required)))
    }

    /// Check for at least `L` and hand back a proof token.
    ///
    /// # Returns
    /// - `Ok(Permission<L>)` if the check passes
    /// - `Err(Error::Forbidden)` if the user holds less than `L`, or nothing
    /// - `Err(Error::FolderNotFound | Error::DocumentNotFound)` if the
    ///   resource does not exist in the tenant
    pub async fn require<L: Level>(
        &self,
        user_id: &str,
        resource_id: &str,
        resource_type: ResourceType,
        tenant_id: &str,
    ) -> Result<Permission<L>> {
        let granted = self
            .evaluate(user_id, resource_id, resource_type, tenant_id)
            .await?;

        match granted {
            Some(effective) if effective.satisfies(L::ACCESS) => Ok(Permission::new(effective)),
            _ => Err(Error::Forbidden {
                resource: format!("{resource_type} {resource_id}"),
                required: L::ACCESS,
            }),
        }
    }
}

/// A document grant counts only for the requested document and user, inside
/// the evaluation tenant and before it expires.
fn usable(
    grant: &DocumentGrant,
    document_id: &str,
    user_id: &str,
    tenant_id: &str,
    now: Timestamp,
) -> bool {
    if grant.tenant_id != tenant_id {
        warn!(
            document_id = %grant.document_id,
            tenant_id,
            grant_tenant = %grant.tenant_id,
            "ignoring document grant from another tenant"
        );
        return false;
    }
    if grant.document_id != document_id || grant.user_id != user_id {
        warn!(
            document_id,
            user_id,
            grant_document = %grant.document_id,
            grant_user = %grant.user_id,
            "ignoring document grant issued for another document or user"
        );
        return false;
    }
    if !grant.is_active_at(now) {
        warn!(
            document_id = %grant.document_id,
            user_id = %grant.user_id,
            "reader returned an expired document grant"
        );
        return false;
    }
    true
}
