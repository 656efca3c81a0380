//! libsql-backed resource graph.
//!
//! Supports multiple backends:
//! - Local SQLite file: `path/to/db.sqlite` or `file:path` or `sqlite://path`
//! - In-memory: `:memory:`
//! - Remote Turso: `libsql://...` or `https://...` (requires TURSO_AUTH_TOKEN env var)
//!
//! Every query filters on `tenant_id`; ancestor paths come from a single
//! recursive CTE bounded by the resolver depth limit.

use jiff::Timestamp;
use libsql::{Builder, Connection, Database, Row, Value, params};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};
use crate::model::{AncestorEntry, Document, DocumentGrant, Folder, FolderGrant, require_id};
use crate::permission::AccessLevel;
use crate::reader::ResourceGraphReader;

/// Connect to the database.
///
/// # URL formats
/// - Local file: `mydata.db`, `file:path/to/db.sqlite`, `sqlite://path`
/// - In-memory: `:memory:`
/// - Remote Turso: `libsql://your-db.turso.io` (requires `TURSO_AUTH_TOKEN` env var)
pub async fn connect(url: &str) -> Result<Database> {
    let db = if url.starts_with("libsql://") || url.starts_with("https://") {
        // Remote Turso database
        let token = std::env::var("TURSO_AUTH_TOKEN").map_err(|_| {
            Error::Config("TURSO_AUTH_TOKEN not set for remote database".into())
        })?;
        Builder::new_remote(url.to_string(), token).build().await?
    } else if url == ":memory:" {
        Builder::new_local(":memory:").build().await?
    } else {
        // Local file - strip sqlite:// or file: prefix if present
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        Builder::new_local(path).build().await?
    };

    Ok(db)
}

/// Get a connection from the database.
pub fn connection(db: &Database) -> Result<Connection> {
    Ok(db.connect()?)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    tenant_id   TEXT NOT NULL,
    id          TEXT NOT NULL,
    parent_id   TEXT,
    name        TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    deleted_at  INTEGER,
    PRIMARY KEY (tenant_id, id)
);
CREATE UNIQUE INDEX IF NOT EXISTS folders_single_root
    ON folders (tenant_id) WHERE parent_id IS NULL AND deleted_at IS NULL;

CREATE TABLE IF NOT EXISTS documents (
    tenant_id   TEXT NOT NULL,
    id          TEXT NOT NULL,
    folder_id   TEXT NOT NULL,
    name        TEXT NOT NULL,
    deleted_at  INTEGER,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS folder_grants (
    tenant_id    TEXT NOT NULL,
    folder_id    TEXT NOT NULL,
    user_id      TEXT NOT NULL,
    access_level TEXT NOT NULL,
    recursive    INTEGER NOT NULL,
    PRIMARY KEY (tenant_id, folder_id, user_id)
);

CREATE TABLE IF NOT EXISTS document_grants (
    tenant_id    TEXT NOT NULL,
    document_id  TEXT NOT NULL,
    user_id      TEXT NOT NULL,
    access_level TEXT NOT NULL,
    expires_at   INTEGER,
    PRIMARY KEY (tenant_id, document_id, user_id)
);
"#;

const ANCESTORS: &str = r#"
WITH RECURSIVE ancestors(id, name, parent_id, depth) AS (
    SELECT id, name, parent_id, 1
    FROM folders
    WHERE tenant_id = ?1 AND id = ?2 AND deleted_at IS NULL
    UNION ALL
    SELECT f.id, f.name, f.parent_id, a.depth + 1
    FROM folders f
    JOIN ancestors a ON f.id = a.parent_id
    WHERE f.tenant_id = ?1 AND f.deleted_at IS NULL AND a.depth <= ?3
)
SELECT id, name, parent_id, depth FROM ancestors ORDER BY depth
"#;

fn millis(ts: Timestamp) -> i64 {
    ts.as_millisecond()
}

fn timestamp(ms: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(ms)
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp {ms}: {e}")))
}

fn nullable_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_string()))
}

fn nullable_millis(value: Option<Timestamp>) -> Value {
    value.map_or(Value::Null, |ts| Value::Integer(millis(ts)))
}

fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(Error::Internal(format!(
            "Expected text in column {idx}, found {other:?}"
        ))),
    }
}

fn opt_timestamp(row: &Row, idx: i32) -> Result<Option<Timestamp>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(ms) => timestamp(ms).map(Some),
        other => Err(Error::Internal(format!(
            "Expected integer in column {idx}, found {other:?}"
        ))),
    }
}

fn level(row: &Row, idx: i32) -> Result<AccessLevel> {
    row.get::<String>(idx)?.parse()
}

/// [`ResourceGraphReader`] over a libsql connection.
#[derive(Clone)]
pub struct Graph {
    conn: Connection,
    max_depth: u32,
}

impl Graph {
    pub fn new(conn: Connection) -> Self {
        Self::with_max_depth(conn, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(conn: Connection, max_depth: u32) -> Self {
        Self { conn, max_depth }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA).await?;
        Ok(())
    }

    async fn exists(&self, sql: &str, tenant_id: &str, id: &str) -> Result<bool> {
        let mut rows = self.conn.query(sql, params![tenant_id, id]).await?;
        Ok(rows.next().await?.is_some())
    }

    /// Add a folder. See [`memory::Graph::insert_folder`](crate::memory::Graph::insert_folder)
    /// for the invariants enforced.
    pub async fn insert_folder(&self, folder: &Folder) -> Result<()> {
        require_id("folder_id", &folder.id)?;
        require_id("tenant_id", &folder.tenant_id)?;

        if self
            .exists(
                "SELECT 1 FROM folders WHERE tenant_id = ?1 AND id = ?2",
                &folder.tenant_id,
                &folder.id,
            )
            .await?
        {
            return Err(Error::Conflict(format!("folder {} already exists", folder.id)));
        }

        match &folder.parent_id {
            None => {
                let mut rows = self
                    .conn
                    .query(
                        "SELECT 1 FROM folders WHERE tenant_id = ?1 AND parent_id IS NULL AND deleted_at IS NULL",
                        params![folder.tenant_id.as_str()],
                    )
                    .await?;
                if rows.next().await?.is_some() {
                    return Err(Error::Conflict(format!(
                        "tenant {} already has a root folder",
                        folder.tenant_id
                    )));
                }
            }
            Some(parent_id) => {
                if self.get_folder(parent_id, &folder.tenant_id).await?.is_none() {
                    return Err(Error::FolderNotFound(parent_id.clone()));
                }
            }
        }

        self.conn
            .execute(
                "INSERT INTO folders (tenant_id, id, parent_id, name, created_by, created_at, updated_at, deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    folder.tenant_id.as_str(),
                    folder.id.as_str(),
                    nullable_text(folder.parent_id.as_deref()),
                    folder.name.as_str(),
                    folder.created_by.as_str(),
                    millis(folder.created_at),
                    millis(folder.updated_at),
                    nullable_millis(folder.deleted_at),
                ],
            )
            .await?;
        tracing::debug!(folder_id = %folder.id, tenant_id = %folder.tenant_id, "folder inserted");
        Ok(())
    }

    /// Add a document to an active folder of its tenant.
    pub async fn insert_document(&self, document: &Document) -> Result<()> {
        require_id("document_id", &document.id)?;
        require_id("tenant_id", &document.tenant_id)?;
        require_id("folder_id", &document.folder_id)?;

        if self
            .exists(
                "SELECT 1 FROM documents WHERE tenant_id = ?1 AND id = ?2",
                &document.tenant_id,
                &document.id,
            )
            .await?
        {
            return Err(Error::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        if self
            .get_folder(&document.folder_id, &document.tenant_id)
            .await?
            .is_none()
        {
            return Err(Error::FolderNotFound(document.folder_id.clone()));
        }

        self.conn
            .execute(
                "INSERT INTO documents (tenant_id, id, folder_id, name, deleted_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    document.tenant_id.as_str(),
                    document.id.as_str(),
                    document.folder_id.as_str(),
                    document.name.as_str(),
                    nullable_millis(document.deleted_at),
                ],
            )
            .await?;
        Ok(())
    }

    /// Store a folder grant, replacing any previous grant for the same user.
    pub async fn grant_folder(&self, grant: &FolderGrant) -> Result<()> {
        require_id("user_id", &grant.user_id)?;
        if self
            .get_folder(&grant.folder_id, &grant.tenant_id)
            .await?
            .is_none()
        {
            return Err(Error::FolderNotFound(grant.folder_id.clone()));
        }

        self.conn
            .execute(
                "INSERT INTO folder_grants (tenant_id, folder_id, user_id, access_level, recursive)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (tenant_id, folder_id, user_id)
                 DO UPDATE SET access_level = excluded.access_level, recursive = excluded.recursive",
                params![
                    grant.tenant_id.as_str(),
                    grant.folder_id.as_str(),
                    grant.user_id.as_str(),
                    grant.access_level.as_str(),
                    i64::from(grant.recursive),
                ],
            )
            .await?;
        Ok(())
    }

    /// Store a document grant, replacing any previous grant for the same user.
    pub async fn grant_document(&self, grant: &DocumentGrant) -> Result<()> {
        require_id("user_id", &grant.user_id)?;
        if self
            .get_document(&grant.document_id, &grant.tenant_id)
            .await?
            .is_none()
        {
            return Err(Error::DocumentNotFound(grant.document_id.clone()));
        }

        self.conn
            .execute(
                "INSERT INTO document_grants (tenant_id, document_id, user_id, access_level, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (tenant_id, document_id, user_id)
                 DO UPDATE SET access_level = excluded.access_level, expires_at = excluded.expires_at",
                params![
                    grant.tenant_id.as_str(),
                    grant.document_id.as_str(),
                    grant.user_id.as_str(),
                    grant.access_level.as_str(),
                    nullable_millis(grant.expires_at),
                ],
            )
            .await?;
        Ok(())
    }

    /// Remove a folder grant. Returns whether one existed.
    pub async fn revoke_folder_grant(
        &self,
        folder_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM folder_grants WHERE tenant_id = ?1 AND folder_id = ?2 AND user_id = ?3",
                params![tenant_id, folder_id, user_id],
            )
            .await?;
        Ok(removed > 0)
    }

    /// Remove a document grant. Returns whether one existed.
    pub async fn revoke_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM document_grants WHERE tenant_id = ?1 AND document_id = ?2 AND user_id = ?3",
                params![tenant_id, document_id, user_id],
            )
            .await?;
        Ok(removed > 0)
    }

    /// Soft-delete a non-root folder.
    pub async fn delete_folder(&self, folder_id: &str, tenant_id: &str) -> Result<()> {
        let folder = self
            .get_folder(folder_id, tenant_id)
            .await?
            .ok_or_else(|| Error::FolderNotFound(folder_id.to_string()))?;
        if folder.is_root() {
            return Err(Error::Conflict(format!(
                "root folder of tenant {tenant_id} cannot be deleted"
            )));
        }

        let now = millis(Timestamp::now());
        self.conn
            .execute(
                "UPDATE folders SET deleted_at = ?3, updated_at = ?3 WHERE tenant_id = ?1 AND id = ?2",
                params![tenant_id, folder_id, now],
            )
            .await?;
        Ok(())
    }

    /// Soft-delete a document.
    pub async fn delete_document(&self, document_id: &str, tenant_id: &str) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE documents SET deleted_at = ?3 WHERE tenant_id = ?1 AND id = ?2 AND deleted_at IS NULL",
                params![tenant_id, document_id, millis(Timestamp::now())],
            )
            .await?;
        if updated == 0 {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }
        Ok(())
    }
}

impl ResourceGraphReader for Graph {
    async fn get_folder(&self, folder_id: &str, tenant_id: &str) -> Result<Option<Folder>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, tenant_id, parent_id, name, created_by, created_at, updated_at
                 FROM folders WHERE tenant_id = ?1 AND id = ?2 AND deleted_at IS NULL",
                params![tenant_id, folder_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(Folder {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            parent_id: opt_text(&row, 2)?,
            name: row.get(3)?,
            created_by: row.get(4)?,
            created_at: timestamp(row.get(5)?)?,
            updated_at: timestamp(row.get(6)?)?,
            deleted_at: None,
        }))
    }

    async fn get_document(&self, document_id: &str, tenant_id: &str) -> Result<Option<Document>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, tenant_id, folder_id, name
                 FROM documents WHERE tenant_id = ?1 AND id = ?2 AND deleted_at IS NULL",
                params![tenant_id, document_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(Document {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            folder_id: row.get(2)?,
            name: row.get(3)?,
            deleted_at: None,
        }))
    }

    async fn get_direct_folder_grant(
        &self,
        folder_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<FolderGrant>> {
        let mut rows = self
            .conn
            .query(
                "SELECT g.folder_id, g.user_id, g.tenant_id, g.access_level, g.recursive
                 FROM folder_grants g
                 JOIN folders f ON f.tenant_id = g.tenant_id AND f.id = g.folder_id
                 WHERE g.tenant_id = ?1 AND g.folder_id = ?2 AND g.user_id = ?3
                   AND f.deleted_at IS NULL",
                params![tenant_id, folder_id, user_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(FolderGrant {
            folder_id: row.get(0)?,
            user_id: row.get(1)?,
            tenant_id: row.get(2)?,
            access_level: level(&row, 3)?,
            recursive: row.get::<i64>(4)? != 0,
        }))
    }

    async fn get_direct_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<DocumentGrant>> {
        let mut rows = self
            .conn
            .query(
                "SELECT g.document_id, g.user_id, g.tenant_id, g.access_level, g.expires_at
                 FROM document_grants g
                 JOIN documents d ON d.tenant_id = g.tenant_id AND d.id = g.document_id
                 WHERE g.tenant_id = ?1 AND g.document_id = ?2 AND g.user_id = ?3
                   AND d.deleted_at IS NULL
                   AND (g.expires_at IS NULL OR g.expires_at > ?4)",
                params![tenant_id, document_id, user_id, millis(Timestamp::now())],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(DocumentGrant {
            document_id: row.get(0)?,
            user_id: row.get(1)?,
            tenant_id: row.get(2)?,
            access_level: level(&row, 3)?,
            expires_at: opt_timestamp(&row, 4)?,
        }))
    }

    async fn get_ancestor_path(&self, folder_id: &str, tenant_id: &str) -> Result<Vec<AncestorEntry>> {
        let folder = self
            .get_folder(folder_id, tenant_id)
            .await?
            .ok_or_else(|| Error::FolderNotFound(folder_id.to_string()))?;
        let Some(parent_id) = folder.parent_id else {
            return Ok(Vec::new());
        };

        let mut rows = self
            .conn
            .query(
                ANCESTORS,
                params![tenant_id, parent_id.as_str(), i64::from(self.max_depth)],
            )
            .await?;

        let mut path = Vec::new();
        let mut dangling = Some(parent_id);
        while let Some(row) = rows.next().await? {
            let depth = u32::try_from(row.get::<i64>(3)?)
                .map_err(|e| Error::Internal(format!("Invalid ancestor depth: {e}")))?;
            if depth > self.max_depth {
                return Err(Error::Internal(format!(
                    "folder {folder_id} is nested deeper than {} levels",
                    self.max_depth
                )));
            }
            path.push(AncestorEntry::new(
                row.get::<String>(0)?,
                row.get::<String>(1)?,
                depth,
            ));
            dangling = opt_text(&row, 2)?;
        }

        // The walk must end at the tenant root; anything else is a missing
        // or deleted ancestor.
        match dangling {
            None => Ok(path),
            Some(missing) => Err(Error::FolderNotFound(missing)),
        }
    }
}
