//! In-process resource graph.
//!
//! Holds folders, documents and grants in tenant-keyed maps behind a
//! `RwLock`. Suitable for embedding, fixtures and tests; the write helpers
//! enforce the data-model invariants (one active root per tenant, one grant
//! per user and resource, parents within the same tenant).

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use jiff::Timestamp;

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};
use crate::model::{AncestorEntry, Document, DocumentGrant, Folder, FolderGrant, require_id};
use crate::reader::ResourceGraphReader;

type Key = (String, String);
type GrantKey = (String, String, String);

fn key(tenant_id: &str, id: &str) -> Key {
    (tenant_id.to_string(), id.to_string())
}

fn grant_key(tenant_id: &str, resource_id: &str, user_id: &str) -> GrantKey {
    (
        tenant_id.to_string(),
        resource_id.to_string(),
        user_id.to_string(),
    )
}

#[derive(Default)]
struct State {
    folders: HashMap<Key, Folder>,
    documents: HashMap<Key, Document>,
    folder_grants: HashMap<GrantKey, FolderGrant>,
    document_grants: HashMap<GrantKey, DocumentGrant>,
}

impl State {
    fn active_folder(&self, folder_id: &str, tenant_id: &str) -> Option<&Folder> {
        self.folders
            .get(&key(tenant_id, folder_id))
            .filter(|f| f.is_active())
    }

    fn active_document(&self, document_id: &str, tenant_id: &str) -> Option<&Document> {
        self.documents
            .get(&key(tenant_id, document_id))
            .filter(|d| d.is_active())
    }
}

/// In-memory [`ResourceGraphReader`].
pub struct Graph {
    state: RwLock<State>,
    max_depth: u32,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Limit how many ancestors `get_ancestor_path` will follow before
    /// reporting a corrupt hierarchy.
    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            state: RwLock::new(State::default()),
            max_depth,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::Internal("resource graph lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::Internal("resource graph lock poisoned".into()))
    }

    /// Add a folder.
    ///
    /// A root folder is refused while the tenant already has an active root;
    /// a child folder needs an active parent in the same tenant.
    pub fn insert_folder(&self, folder: Folder) -> Result<()> {
        require_id("folder_id", &folder.id)?;
        require_id("tenant_id", &folder.tenant_id)?;
        let mut state = self.write()?;

        let k = key(&folder.tenant_id, &folder.id);
        if state.folders.contains_key(&k) {
            return Err(Error::Conflict(format!("folder {} already exists", folder.id)));
        }

        match &folder.parent_id {
            None => {
                let has_root = state
                    .folders
                    .values()
                    .any(|f| f.tenant_id == folder.tenant_id && f.is_root() && f.is_active());
                if has_root {
                    return Err(Error::Conflict(format!(
                        "tenant {} already has a root folder",
                        folder.tenant_id
                    )));
                }
            }
            Some(parent_id) => {
                if state.active_folder(parent_id, &folder.tenant_id).is_none() {
                    return Err(Error::FolderNotFound(parent_id.clone()));
                }
            }
        }

        tracing::debug!(folder_id = %folder.id, tenant_id = %folder.tenant_id, "folder inserted");
        state.folders.insert(k, folder);
        Ok(())
    }

    /// Add a document to an active folder of its tenant.
    pub fn insert_document(&self, document: Document) -> Result<()> {
        require_id("document_id", &document.id)?;
        require_id("tenant_id", &document.tenant_id)?;
        require_id("folder_id", &document.folder_id)?;
        let mut state = self.write()?;

        let k = key(&document.tenant_id, &document.id);
        if state.documents.contains_key(&k) {
            return Err(Error::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        if state
            .active_folder(&document.folder_id, &document.tenant_id)
            .is_none()
        {
            return Err(Error::FolderNotFound(document.folder_id.clone()));
        }

        state.documents.insert(k, document);
        Ok(())
    }

    /// Store a folder grant, replacing any previous grant for the same user.
    /// Returns the replaced grant.
    pub fn grant_folder(&self, grant: FolderGrant) -> Result<Option<FolderGrant>> {
        require_id("user_id", &grant.user_id)?;
        let mut state = self.write()?;
        if state
            .active_folder(&grant.folder_id, &grant.tenant_id)
            .is_none()
        {
            return Err(Error::FolderNotFound(grant.folder_id.clone()));
        }
        let k = grant_key(&grant.tenant_id, &grant.folder_id, &grant.user_id);
        Ok(state.folder_grants.insert(k, grant))
    }

    /// Store a document grant, replacing any previous grant for the same user.
    /// Returns the replaced grant.
    pub fn grant_document(&self, grant: DocumentGrant) -> Result<Option<DocumentGrant>> {
        require_id("user_id", &grant.user_id)?;
        let mut state = self.write()?;
        if state
            .active_document(&grant.document_id, &grant.tenant_id)
            .is_none()
        {
            return Err(Error::DocumentNotFound(grant.document_id.clone()));
        }
        let k = grant_key(&grant.tenant_id, &grant.document_id, &grant.user_id);
        Ok(state.document_grants.insert(k, grant))
    }

    /// Remove a folder grant. Returns whether one existed.
    pub fn revoke_folder_grant(&self, folder_id: &str, user_id: &str, tenant_id: &str) -> Result<bool> {
        let mut state = self.write()?;
        Ok(state
            .folder_grants
            .remove(&grant_key(tenant_id, folder_id, user_id))
            .is_some())
    }

    /// Remove a document grant. Returns whether one existed.
    pub fn revoke_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<bool> {
        let mut state = self.write()?;
        Ok(state
            .document_grants
            .remove(&grant_key(tenant_id, document_id, user_id))
            .is_some())
    }

    /// Soft-delete a folder. Descendants are left in place, so resolving
    /// them fails closed until they are moved or deleted too.
    pub fn delete_folder(&self, folder_id: &str, tenant_id: &str) -> Result<()> {
        let mut state = self.write()?;
        let folder = state
            .folders
            .get_mut(&key(tenant_id, folder_id))
            .filter(|f| f.is_active())
            .ok_or_else(|| Error::FolderNotFound(folder_id.to_string()))?;
        if folder.is_root() {
            return Err(Error::Conflict(format!(
                "root folder of tenant {tenant_id} cannot be deleted"
            )));
        }
        let now = Timestamp::now();
        folder.deleted_at = Some(now);
        folder.updated_at = now;
        Ok(())
    }

    /// Soft-delete a document.
    pub fn delete_document(&self, document_id: &str, tenant_id: &str) -> Result<()> {
        let mut state = self.write()?;
        let document = state
            .documents
            .get_mut(&key(tenant_id, document_id))
            .filter(|d| d.is_active())
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;
        document.deleted_at = Some(Timestamp::now());
        Ok(())
    }
}

impl ResourceGraphReader for Graph {
    async fn get_folder(&self, folder_id: &str, tenant_id: &str) -> Result<Option<Folder>> {
        Ok(self.read()?.active_folder(folder_id, tenant_id).cloned())
    }

    async fn get_document(&self, document_id: &str, tenant_id: &str) -> Result<Option<Document>> {
        Ok(self.read()?.active_document(document_id, tenant_id).cloned())
    }

    async fn get_direct_folder_grant(
        &self,
        folder_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<FolderGrant>> {
        let state = self.read()?;
        if state.active_folder(folder_id, tenant_id).is_none() {
            return Ok(None);
        }
        Ok(state
            .folder_grants
            .get(&grant_key(tenant_id, folder_id, user_id))
            .cloned())
    }

    async fn get_direct_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<DocumentGrant>> {
        let now = Timestamp::now();
        let state = self.read()?;
        if state.active_document(document_id, tenant_id).is_none() {
            return Ok(None);
        }
        Ok(state
            .document_grants
            .get(&grant_key(tenant_id, document_id, user_id))
            .filter(|g| g.is_active_at(now))
            .cloned())
    }

    async fn get_ancestor_path(&self, folder_id: &str, tenant_id: &str) -> Result<Vec<AncestorEntry>> {
        let state = self.read()?;
        let folder = state
            .active_folder(folder_id, tenant_id)
            .ok_or_else(|| Error::FolderNotFound(folder_id.to_string()))?;

        let mut path = Vec::new();
        let mut next = folder.parent_id.as_deref();
        let mut depth = 1;
        while let Some(parent_id) = next {
            if depth > self.max_depth {
                return Err(Error::Internal(format!(
                    "folder {folder_id} is nested deeper than {} levels",
                    self.max_depth
                )));
            }
            let parent = state
                .active_folder(parent_id, tenant_id)
                .ok_or_else(|| Error::FolderNotFound(parent_id.to_string()))?;
            path.push(AncestorEntry::new(&parent.id, &parent.name, depth));
            next = parent.parent_id.as_deref();
            depth += 1;
        }
        Ok(path)
    }
}
