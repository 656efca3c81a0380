//! Tenant isolation: records of one tenant never grant access in another,
//! even when ids coincide or a reader fails to scope its queries.

use std::sync::Arc;

use folio::memory::Graph;
use folio::{
    AccessLevel, AncestorEntry, Document, DocumentGrant, Error, Folder, FolderGrant,
    PermissionEvaluator, ResourceGraphReader, ResourceType,
};

use super::{TENANT, USER, hierarchy};

const OTHER: &str = "globex";

/// Same ids as the home hierarchy, owned by another tenant, where the user
/// holds ADMIN everywhere.
fn add_foreign(graph: &Graph) {
    graph
        .insert_folder(Folder::new("root", OTHER, None, "Root", "owner"))
        .unwrap();
    graph
        .insert_folder(Folder::new("F1", OTHER, Some("root"), "Engineering", "owner"))
        .unwrap();
    graph
        .insert_folder(Folder::new("F2", OTHER, Some("F1"), "Design Docs", "owner"))
        .unwrap();
    graph
        .insert_document(Document::new("D", OTHER, "F2", "architecture.md"))
        .unwrap();
    for folder in ["root", "F1", "F2"] {
        graph
            .grant_folder(FolderGrant::new(folder, USER, OTHER, AccessLevel::Admin, true))
            .unwrap();
    }
    graph
        .grant_document(DocumentGrant::new("D", USER, OTHER, AccessLevel::Admin))
        .unwrap();
}

fn foreign() -> Graph {
    let graph = Graph::new();
    add_foreign(&graph);
    graph
}

/// A faulty reader: the hierarchy is tenant-scoped but grant lookups ignore
/// the requested tenant and read from another one.
struct Leaky {
    home: Graph,
    foreign: Graph,
}

impl ResourceGraphReader for Leaky {
    async fn get_folder(&self, folder_id: &str, tenant_id: &str) -> folio::Result<Option<Folder>> {
        self.home.get_folder(folder_id, tenant_id).await
    }

    async fn get_document(
        &self,
        document_id: &str,
        tenant_id: &str,
    ) -> folio::Result<Option<Document>> {
        self.home.get_document(document_id, tenant_id).await
    }

    async fn get_direct_folder_grant(
        &self,
        folder_id: &str,
        user_id: &str,
        _tenant_id: &str,
    ) -> folio::Result<Option<FolderGrant>> {
        self.foreign
            .get_direct_folder_grant(folder_id, user_id, OTHER)
            .await
    }

    async fn get_direct_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
        _tenant_id: &str,
    ) -> folio::Result<Option<DocumentGrant>> {
        self.foreign
            .get_direct_document_grant(document_id, user_id, OTHER)
            .await
    }

    async fn get_ancestor_path(
        &self,
        folder_id: &str,
        tenant_id: &str,
    ) -> folio::Result<Vec<AncestorEntry>> {
        self.home.get_ancestor_path(folder_id, tenant_id).await
    }
}

/// Returns folders belonging to whichever tenant owns the id, ignoring the
/// requested one.
struct Unscoped {
    foreign: Graph,
}

impl ResourceGraphReader for Unscoped {
    async fn get_folder(&self, folder_id: &str, _tenant_id: &str) -> folio::Result<Option<Folder>> {
        self.foreign.get_folder(folder_id, OTHER).await
    }

    async fn get_document(
        &self,
        document_id: &str,
        _tenant_id: &str,
    ) -> folio::Result<Option<Document>> {
        self.foreign.get_document(document_id, OTHER).await
    }

    async fn get_direct_folder_grant(
        &self,
        _folder_id: &str,
        _user_id: &str,
        _tenant_id: &str,
    ) -> folio::Result<Option<FolderGrant>> {
        Ok(None)
    }

    async fn get_direct_document_grant(
        &self,
        _document_id: &str,
        _user_id: &str,
        _tenant_id: &str,
    ) -> folio::Result<Option<DocumentGrant>> {
        Ok(None)
    }

    async fn get_ancestor_path(
        &self,
        folder_id: &str,
        _tenant_id: &str,
    ) -> folio::Result<Vec<AncestorEntry>> {
        self.foreign.get_ancestor_path(folder_id, OTHER).await
    }
}

#[tokio::test]
async fn coinciding_ids_do_not_cross_tenants() {
    // Both tenants live in the same store.
    let graph = hierarchy();
    add_foreign(&graph);
    let evaluator = PermissionEvaluator::new(Arc::new(graph));

    for folder in ["root", "F1", "F2"] {
        assert!(evaluator
            .evaluate_for_folder(USER, folder, TENANT)
            .await
            .unwrap()
            .is_none());
        assert!(evaluator
            .evaluate_for_folder(USER, folder, OTHER)
            .await
            .unwrap()
            .is_some());
    }
    assert!(evaluator
        .evaluate_for_document(USER, "D", TENANT)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn foreign_grants_from_a_leaky_reader_are_ignored() {
    let evaluator = PermissionEvaluator::new(Arc::new(Leaky {
        home: hierarchy(),
        foreign: foreign(),
    }));

    let on_document = evaluator
        .evaluate_for_document(USER, "D", TENANT)
        .await
        .unwrap();
    assert!(on_document.is_none(), "leaked grant: {on_document:?}");

    for folder in ["root", "F1", "F2"] {
        let allowed = evaluator
            .has_access(USER, folder, ResourceType::Folder, AccessLevel::Read, TENANT)
            .await
            .unwrap();
        assert!(!allowed, "{folder} leaked across tenants");
    }
}

#[tokio::test]
async fn foreign_resources_from_an_unscoped_reader_are_not_found() {
    let evaluator = PermissionEvaluator::new(Arc::new(Unscoped { foreign: foreign() }));

    let err = evaluator
        .evaluate_for_folder(USER, "F2", TENANT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FolderNotFound(_)));

    let err = evaluator
        .evaluate_for_document(USER, "D", TENANT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(_)));
}

#[test]
fn grants_cannot_target_another_tenants_folder() {
    let graph = hierarchy();
    let err = graph
        .grant_folder(FolderGrant::new("F1", USER, OTHER, AccessLevel::Admin, true))
        .unwrap_err();
    assert!(matches!(err, Error::FolderNotFound(_)));
}
