//! Folio - permission resolution for multi-tenant document management.
//!
//! Folio decides which single access level a user holds on a document or
//! folder of a tenant:
//!
//! - **Permission**: Access levels (Read < Write < Admin) and typed permission tokens
//! - **Resolver**: Folder inheritance along the ancestor chain
//! - **Evaluator**: Document > direct folder > inherited folder precedence
//! - **Reader**: The read-only data contract, with in-memory and libsql implementations
//! - **Config**: Layered configuration (file → env → CLI)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use folio::{AccessLevel, PermissionEvaluator, ResourceType};
//!
//! #[tokio::main]
//! async fn main() -> folio::Result<()> {
//!     let config = folio::ConfigLoader::new("MYAPP").load(None, None, None)?;
//!
//!     let db = folio::db::connect(&config.database.url).await?;
//!     let graph = folio::db::Graph::with_max_depth(
//!         folio::db::connection(&db)?,
//!         config.resolver.max_depth,
//!     );
//!     graph.migrate().await?;
//!
//!     let evaluator = PermissionEvaluator::with_config(Arc::new(graph), &config.resolver);
//!     let allowed = evaluator
//!         .has_access("user-1", "doc-7", ResourceType::Document, AccessLevel::Write, "acme")
//!         .await?;
//!     println!("write allowed: {allowed}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod effective;
pub mod error;
pub mod evaluator;
pub mod memory;
pub mod model;
pub mod permission;
pub mod reader;
pub mod resolver;

// Re-export main types at crate root
pub use config::{Config, ConfigLoader};
pub use effective::{EffectivePermission, Origin};
pub use error::{Error, Result};
pub use evaluator::PermissionEvaluator;
pub use model::{AncestorEntry, Document, DocumentGrant, Folder, FolderGrant, ResourceType};
pub use permission::{AccessLevel, Level, Permission, level, satisfies};
pub use reader::ResourceGraphReader;
pub use resolver::{FolderInheritanceResolver, Visit};
