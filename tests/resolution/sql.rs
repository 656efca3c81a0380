//! The libsql reader resolves exactly like the in-memory one.

use std::sync::Arc;

use folio::db::{self, Graph as SqlGraph};
use folio::memory::Graph as MemoryGraph;
use folio::{
    AccessLevel, Document, DocumentGrant, Folder, FolderGrant, Origin, PermissionEvaluator,
    ResourceGraphReader, ResourceType,
};

use super::{TENANT, USER};

/// root → F1 → F2 → F3, document D in F3.
fn folders() -> Vec<Folder> {
    vec![
        Folder::new("root", TENANT, None, "Root", "owner"),
        Folder::new("F1", TENANT, Some("root"), "Legal", "owner"),
        Folder::new("F2", TENANT, Some("F1"), "Contracts", "owner"),
        Folder::new("F3", TENANT, Some("F2"), "2024", "owner"),
    ]
}

fn folder_grants() -> Vec<FolderGrant> {
    vec![
        FolderGrant::new("root", USER, TENANT, AccessLevel::Admin, true),
        FolderGrant::new("F1", USER, TENANT, AccessLevel::Read, false),
        FolderGrant::new("F2", "u-2", TENANT, AccessLevel::Write, true),
        FolderGrant::new("F3", "u-3", TENANT, AccessLevel::Read, false),
    ]
}

async fn sql_graph() -> (libsql::Database, SqlGraph) {
    let database = db::connect(":memory:").await.unwrap();
    let graph = SqlGraph::new(db::connection(&database).unwrap());
    graph.migrate().await.unwrap();

    for folder in folders() {
        graph.insert_folder(&folder).await.unwrap();
    }
    graph
        .insert_document(&Document::new("D", TENANT, "F3", "nda.pdf"))
        .await
        .unwrap();
    for grant in folder_grants() {
        graph.grant_folder(&grant).await.unwrap();
    }
    graph
        .grant_document(&DocumentGrant::new("D", "u-4", TENANT, AccessLevel::Write))
        .await
        .unwrap();
    (database, graph)
}

fn memory_graph() -> MemoryGraph {
    let graph = MemoryGraph::new();
    for folder in folders() {
        graph.insert_folder(folder).unwrap();
    }
    graph
        .insert_document(Document::new("D", TENANT, "F3", "nda.pdf"))
        .unwrap();
    for grant in folder_grants() {
        graph.grant_folder(grant).unwrap();
    }
    graph
        .grant_document(DocumentGrant::new("D", "u-4", TENANT, AccessLevel::Write))
        .unwrap();
    graph
}

#[tokio::test]
async fn sql_and_memory_readers_agree() {
    let (_database, sql) = sql_graph().await;
    let sql = PermissionEvaluator::new(Arc::new(sql));
    let memory = PermissionEvaluator::new(Arc::new(memory_graph()));

    let users = [USER, "u-2", "u-3", "u-4", "nobody"];
    let resources = [
        ("root", ResourceType::Folder),
        ("F1", ResourceType::Folder),
        ("F2", ResourceType::Folder),
        ("F3", ResourceType::Folder),
        ("D", ResourceType::Document),
    ];

    for user in users {
        for (id, kind) in resources {
            let from_sql = sql.evaluate(user, id, kind, TENANT).await.unwrap();
            let from_memory = memory.evaluate(user, id, kind, TENANT).await.unwrap();
            assert_eq!(from_sql, from_memory, "{user} on {kind} {id}");
        }
    }
}

#[tokio::test]
async fn sql_reader_applies_blocking_rule() {
    let (_database, graph) = sql_graph().await;
    let evaluator = PermissionEvaluator::new(Arc::new(graph));

    // USER: non-recursive READ on F1 shadows recursive ADMIN on root.
    let on_f1 = evaluator
        .evaluate_for_folder(USER, "F1", TENANT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(on_f1.origin(), Origin::FolderDirect);
    assert!(evaluator
        .evaluate_for_document(USER, "D", TENANT)
        .await
        .unwrap()
        .is_none());

    // u-2 inherits WRITE from F2 down to D.
    let perm = evaluator
        .evaluate_for_document("u-2", "D", TENANT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(perm.origin(), Origin::FolderInherited);
    assert_eq!(perm.inheritance_path(), ["Contracts", "2024"]);

    // u-4 has a document grant.
    assert!(evaluator
        .has_access("u-4", "D", ResourceType::Document, AccessLevel::Write, TENANT)
        .await
        .unwrap());
}

#[tokio::test]
async fn sql_reader_is_tenant_scoped() {
    let (_database, graph) = sql_graph().await;
    graph
        .insert_folder(&Folder::new("root", "globex", None, "Root", "owner"))
        .await
        .unwrap();

    assert!(graph.get_folder("F1", "globex").await.unwrap().is_none());
    assert!(graph
        .get_direct_folder_grant("root", USER, "globex")
        .await
        .unwrap()
        .is_none());

    let evaluator = PermissionEvaluator::new(Arc::new(graph));
    assert!(evaluator
        .evaluate_for_folder(USER, "root", "globex")
        .await
        .unwrap()
        .is_none());
}
