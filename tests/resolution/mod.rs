//! Shared fixtures for the resolution suite.

mod error_disclosure;
mod sql;
mod tenant_isolation;

use std::sync::Arc;

use folio::memory::Graph;
use folio::{AccessLevel, Document, Folder, FolderGrant};

pub const TENANT: &str = "acme";
pub const USER: &str = "u-1";

/// root → F1 → F2, with document D in F2 and no grants.
pub fn hierarchy() -> Graph {
    let graph = Graph::new();
    graph
        .insert_folder(Folder::new("root", TENANT, None, "Root", "owner"))
        .unwrap();
    graph
        .insert_folder(Folder::new("F1", TENANT, Some("root"), "Engineering", "owner"))
        .unwrap();
    graph
        .insert_folder(Folder::new("F2", TENANT, Some("F1"), "Design Docs", "owner"))
        .unwrap();
    graph
        .insert_document(Document::new("D", TENANT, "F2", "architecture.md"))
        .unwrap();
    graph
}

/// The hierarchy plus `FolderGrant(F1, U, WRITE, recursive)`.
pub fn scenario_a() -> Arc<Graph> {
    let graph = hierarchy();
    graph
        .grant_folder(FolderGrant::new("F1", USER, TENANT, AccessLevel::Write, true))
        .unwrap();
    Arc::new(graph)
}
