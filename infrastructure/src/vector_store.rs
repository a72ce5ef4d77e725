use crate::search::{Candidate, SearchEngine};
use domain::models::PassageNode;
use domain::ports::VectorRetriever;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use shared::types::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector store unreachable: {0}")]
    Connectivity(String),
    #[error("vector index {index:?} not found for collection {collection:?}")]
    IndexNotFound { index: String, collection: String },
    #[error("query embedding has {actual} dimensions, index {index:?} expects {expected}")]
    DimensionMismatch {
        index: String,
        expected: usize,
        actual: usize,
    },
    #[error("stored passage {id:?} is unreadable: {reason}")]
    Corrupt { id: String, reason: String },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// A passage row as written to the store.
#[derive(Debug, Clone)]
pub struct StoredPassage {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub vector: Vec<f32>,
}

impl StoredPassage {
    /// Id derived from the text, so identical passages collapse into one row.
    pub fn new(
        text: impl Into<String>,
        metadata: BTreeMap<String, String>,
        vector: Vec<f32>,
    ) -> Self {
        let text = text.into();
        let id = format!("{:x}", md5::compute(text.as_bytes()));
        Self {
            id,
            text,
            metadata,
            vector,
        }
    }
}

/// Similarity search over passages kept in SQLite, scoped to one collection
/// and one named index.
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    index_name: String,
}

/// Accepts `sqlite://<path>` or a bare path.
pub fn store_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("sqlite://").unwrap_or(uri))
}

impl SqliteVectorStore {
    /// Open an existing store. Never creates the database file.
    pub fn connect(uri: &str, collection: &str, index_name: &str) -> Result<Self, StoreError> {
        let path = store_path(uri);
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(|e| StoreError::Connectivity(e.to_string()))?;
        Ok(Self::from_connection(conn, collection, index_name))
    }

    /// Create (or reopen) a store file with the schema and the named index registered.
    pub fn create(
        db_path: impl AsRef<Path>,
        collection: &str,
        index_name: &str,
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Connectivity(e.to_string()))?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::setup_db(&conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO vector_indexes (name, collection, dimensions)
             VALUES (?1, ?2, ?3)",
            params![index_name, collection, dimensions as i64],
        )?;
        Ok(Self::from_connection(conn, collection, index_name))
    }

    fn from_connection(conn: Connection, collection: &str, index_name: &str) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
            index_name: index_name.to_string(),
        }
    }

    fn setup_db(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS vector_indexes (
                name TEXT NOT NULL,
                collection TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                PRIMARY KEY (name, collection)
            );
            CREATE TABLE IF NOT EXISTS passages (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                vector BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );
        ",
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Connectivity("store connection lock poisoned".to_string()))
    }

    /// Startup check: the database answers and the configured index exists.
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Connectivity(e.to_string()))?;
        let dims = index_dimensions(&conn, &self.index_name, &self.collection)?;
        info!(
            collection = %self.collection,
            index = %self.index_name,
            dimensions = dims,
            "vector store reachable"
        );
        Ok(())
    }

    pub fn upsert_passages(&self, passages: &[StoredPassage]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO passages (collection, id, text, metadata, vector)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for passage in passages {
                let metadata = serde_json::to_string(&passage.metadata).map_err(|e| {
                    StoreError::Corrupt {
                        id: passage.id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let vector_bytes = serde_json::to_vec(&passage.vector).map_err(|e| {
                    StoreError::Corrupt {
                        id: passage.id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                stmt.execute(params![
                    self.collection,
                    passage.id,
                    passage.text,
                    metadata,
                    vector_bytes
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Blocking top-k search.
    pub fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<PassageNode>, StoreError> {
        let conn = self.lock()?;
        let expected = index_dimensions(&conn, &self.index_name, &self.collection)?;
        if embedding.len() != expected {
            return Err(StoreError::DimensionMismatch {
                index: self.index_name.clone(),
                expected,
                actual: embedding.len(),
            });
        }

        let rows = load_collection(&conn, &self.collection)?;
        drop(conn);

        let candidates: Vec<Candidate<'_>> = rows
            .iter()
            .map(|row| Candidate {
                id: &row.id,
                vector: &row.vector,
            })
            .collect();
        let hits = SearchEngine::top_k(embedding, &candidates, k);
        debug!(scanned = rows.len(), returned = hits.len(), "similarity search done");

        Ok(hits
            .into_iter()
            .map(|(i, score)| {
                let row = &rows[i];
                PassageNode::new(row.id.clone(), row.text.clone(), row.metadata.clone(), score)
            })
            .collect())
    }
}

fn index_dimensions(conn: &Connection, index: &str, collection: &str) -> Result<usize, StoreError> {
    let dims: Option<i64> = conn
        .query_row(
            "SELECT dimensions FROM vector_indexes WHERE name = ?1 AND collection = ?2",
            params![index, collection],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| match e {
            // A database without the schema has no index to serve.
            rusqlite::Error::SqliteFailure(_, Some(ref msg))
                if msg.starts_with("no such table") =>
            {
                StoreError::IndexNotFound {
                    index: index.to_string(),
                    collection: collection.to_string(),
                }
            }
            other => StoreError::Connectivity(other.to_string()),
        })?;
    match dims {
        Some(d) => Ok(d as usize),
        None => Err(StoreError::IndexNotFound {
            index: index.to_string(),
            collection: collection.to_string(),
        }),
    }
}

fn load_collection(conn: &Connection, collection: &str) -> Result<Vec<StoredPassage>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, text, metadata, vector FROM passages WHERE collection = ?1")?;
    let mut rows = stmt.query([collection])?;
    let mut passages = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let text: String = row.get(1)?;
        let metadata: String = row.get(2)?;
        let vector_bytes: Vec<u8> = row.get(3)?;
        let metadata: BTreeMap<String, String> =
            serde_json::from_str(&metadata).map_err(|e| StoreError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;
        let vector: Vec<f32> =
            serde_json::from_slice(&vector_bytes).map_err(|e| StoreError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;
        passages.push(StoredPassage {
            id,
            text,
            metadata,
            vector,
        });
    }
    Ok(passages)
}

impl VectorRetriever for SqliteVectorStore {
    async fn retrieve(&self, embedding: &[f32], k: usize) -> Result<Vec<PassageNode>> {
        let store = self.clone();
        let embedding = embedding.to_vec();
        let nodes = tokio::task::spawn_blocking(move || store.search(&embedding, k)).await??;
        Ok(nodes)
    }
}
