//! SQLite-backed [`VectorStore`] using the `sqlite-vec` extension.
//!
//! Payloads live in a plain `chunks` table, embeddings in a parallel
//! `chunk_embeddings` table keyed by the same content-addressed id.
//! Similarity queries rank with `vec_distance_cosine`; regulation filters
//! compile to an `IN (SELECT value FROM json_each(?))` membership test so a
//! single prepared statement covers the one-code and many-code cases.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension, ffi};

use super::{ChunkPayload, ChunkPoint, RegulationFilter, ScoredChunk, VectorStore};
use crate::types::RagError;

const META_DIMENSION_KEY: &str = "dimension";

#[derive(Clone)]
pub struct SqliteRegulationStore {
    conn: Connection,
}

impl SqliteRegulationStore {
    /// Opens (or creates) a store at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        Self::from_connection(conn).await
    }

    /// Opens an in-memory store. Mostly useful in tests.
    pub async fn open_in_memory() -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        Self::from_connection(conn).await
    }

    async fn from_connection(conn: Connection) -> Result<Self, RagError> {
        // Fail fast if the vec extension did not load.
        conn.call(|conn| {
            conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Total number of stored chunks.
    pub async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }
}

#[async_trait]
impl VectorStore for SqliteRegulationStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), RagError> {
        let stored = self
            .conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.execute_batch(
                    "CREATE TABLE IF NOT EXISTS collection_meta (
                         key TEXT PRIMARY KEY,
                         value TEXT NOT NULL
                     );
                     CREATE TABLE IF NOT EXISTS chunks (
                         id TEXT PRIMARY KEY,
                         regulation TEXT NOT NULL,
                         article_no INTEGER,
                         title TEXT NOT NULL,
                         source_url TEXT NOT NULL,
                         chunk_index INTEGER NOT NULL,
                         content TEXT NOT NULL
                     );
                     CREATE TABLE IF NOT EXISTS chunk_embeddings (
                         id TEXT PRIMARY KEY,
                         embedding BLOB NOT NULL
                     );
                     CREATE INDEX IF NOT EXISTS idx_chunks_regulation ON chunks(regulation);
                     CREATE INDEX IF NOT EXISTS idx_chunks_article_no ON chunks(article_no);",
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let existing: Option<String> = tx
                    .query_row(
                        "SELECT value FROM collection_meta WHERE key = ?1",
                        (META_DIMENSION_KEY,),
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                if existing.is_none() {
                    tx.execute(
                        "INSERT INTO collection_meta (key, value) VALUES (?1, ?2)",
                        (META_DIMENSION_KEY, dimension.to_string()),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(existing)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;

        if let Some(existing) = stored {
            if existing != dimension.to_string() {
                return Err(RagError::Storage(format!(
                    "collection holds {existing}-dimensional vectors, got {dimension}"
                )));
            }
        }
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), RagError> {
        if points.is_empty() {
            return Ok(());
        }

        // Serialize vectors outside the connection closure.
        let mut rows = Vec::with_capacity(points.len());
        for point in points {
            let vector_json = serde_json::to_string(&point.vector)
                .map_err(|err| RagError::Storage(err.to_string()))?;
            rows.push((point.id.to_string(), vector_json, point.payload));
        }

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                for (id, vector_json, payload) in &rows {
                    tx.execute(
                        "INSERT OR REPLACE INTO chunks
                             (id, regulation, article_no, title, source_url, chunk_index, content)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        (
                            id,
                            &payload.regulation,
                            payload.article_no.map(i64::from),
                            &payload.title,
                            &payload.source_url,
                            payload.chunk_index as i64,
                            &payload.content,
                        ),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    tx.execute(
                        "INSERT OR REPLACE INTO chunk_embeddings (id, embedding)
                         VALUES (?1, vec_f32(?2))",
                        (id, vector_json),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn query(
        &self,
        vector: &[f32],
        filter: &RegulationFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        let embedding_json = serde_json::to_string(vector)
            .map_err(|err| RagError::Storage(err.to_string()))?;
        let codes_json = if filter.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(filter.codes())
                    .map_err(|err| RagError::Storage(err.to_string()))?,
            )
        };

        self.conn
            .call(move |conn| {
                let where_clause = if codes_json.is_some() {
                    "WHERE c.regulation IN (SELECT value FROM json_each(?2))"
                } else {
                    ""
                };
                let sql = format!(
                    "SELECT c.content, c.regulation, c.article_no, c.title, c.source_url,
                            c.chunk_index,
                            vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance
                     FROM chunks c
                     JOIN chunk_embeddings e ON c.id = e.id
                     {where_clause}
                     ORDER BY distance ASC
                     LIMIT {limit}"
                );
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                // Cosine distance converts to similarity as 1 - distance.
                if let Some(codes_json) = codes_json {
                    let rows = stmt
                        .query_map((&embedding_json, &codes_json), |row| {
                            let distance: f32 = row.get(6)?;
                            Ok(ScoredChunk {
                                payload: ChunkPayload {
                                    content: row.get(0)?,
                                    regulation: row.get(1)?,
                                    article_no: row
                                        .get::<_, Option<i64>>(2)?
                                        .map(|n| n as u32),
                                    title: row.get(3)?,
                                    source_url: row.get(4)?,
                                    chunk_index: row.get::<_, i64>(5)? as usize,
                                },
                                score: 1.0 - distance,
                            })
                        })
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    for row in rows {
                        results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                    }
                } else {
                    let rows = stmt
                        .query_map((&embedding_json,), |row| {
                            let distance: f32 = row.get(6)?;
                            Ok(ScoredChunk {
                                payload: ChunkPayload {
                                    content: row.get(0)?,
                                    regulation: row.get(1)?,
                                    article_no: row
                                        .get::<_, Option<i64>>(2)?
                                        .map(|n| n as u32),
                                    title: row.get(3)?,
                                    source_url: row.get(4)?,
                                    chunk_index: row.get::<_, i64>(5)? as usize,
                                },
                                score: 1.0 - distance,
                            })
                        })
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    for row in rows {
                        results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                    }
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn scroll(&self, limit: usize) -> Result<Vec<ChunkPayload>, RagError> {
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT content, regulation, article_no, title, source_url, chunk_index
                     FROM chunks
                     LIMIT {limit}"
                );
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(ChunkPayload {
                            content: row.get(0)?,
                            regulation: row.get(1)?,
                            article_no: row.get::<_, Option<i64>>(2)?.map(|n| n as u32),
                            title: row.get(3)?,
                            source_url: row.get(4)?,
                            chunk_index: row.get::<_, i64>(5)? as usize,
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn delete_by_regulation(&self, regulation: &str) -> Result<usize, RagError> {
        let regulation = regulation.to_lowercase();
        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.execute(
                    "DELETE FROM chunk_embeddings
                     WHERE id IN (SELECT id FROM chunks WHERE regulation = ?1)",
                    (&regulation,),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let deleted = tx
                    .execute("DELETE FROM chunks WHERE regulation = ?1", (&regulation,))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(deleted)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn ping(&self) -> bool {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .is_ok()
    }
}

/// Registers the sqlite-vec extension for every subsequently opened
/// connection. Process-wide, idempotent.
fn register_sqlite_vec() -> Result<(), RagError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| unsafe {
            type ExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init: ExtensionInit = transmute::<unsafe extern "C" fn(), ExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init));
            if rc == 0 {
                Ok(())
            } else {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            }
        })
        .clone()
        .map_err(RagError::Storage)
}
