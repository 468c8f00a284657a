use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::StatsError;

/// Keyed blob storage for the persisted statistics snapshot.
///
/// A store call either fully replaces the blob or leaves the previous one in place.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn load_blob(&self, key: &str) -> Result<Option<String>, StatsError>;
    async fn store_blob(&self, key: &str, blob: String) -> Result<(), StatsError>;
    async fn remove_blob(&self, key: &str) -> Result<(), StatsError>;
}

/// In-memory implementation for development and testing
#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a repository with a pre-populated blob
    pub fn with_blob(key: &str, blob: impl Into<String>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::from([(key.to_string(), blob.into())])),
        }
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn load_blob(&self, key: &str) -> Result<Option<String>, StatsError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(key).cloned())
    }

    async fn store_blob(&self, key: &str, blob: String) -> Result<(), StatsError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), blob);
        Ok(())
    }

    async fn remove_blob(&self, key: &str) -> Result<(), StatsError> {
        let mut blobs = self.blobs.write().await;
        blobs.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a data directory
pub struct FileStatsRepository {
    data_dir: PathBuf,
}

impl FileStatsRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.data_dir.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl StatsRepository for FileStatsRepository {
    #[instrument(skip(self))]
    async fn load_blob(&self, key: &str) -> Result<Option<String>, StatsError> {
        let path = self.blob_path(key);
        debug!(path = %path.display(), "Reading statistics blob from disk");

        match tokio::fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No statistics blob on disk");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to read statistics blob");
                Err(StatsError::storage(e.to_string()))
            }
        }
    }

    #[instrument(skip(self, blob))]
    async fn store_blob(&self, key: &str, blob: String) -> Result<(), StatsError> {
        let path = self.blob_path(key);
        let staging = path.with_extension("json.tmp");
        debug!(path = %path.display(), bytes = blob.len(), "Writing statistics blob to disk");

        let write = async {
            tokio::fs::create_dir_all(&self.data_dir).await?;
            tokio::fs::write(&staging, blob.as_bytes()).await?;
            tokio::fs::rename(&staging, &path).await
        };

        write.await.map_err(|e| {
            warn!(error = %e, path = %path.display(), "Failed to write statistics blob");
            StatsError::storage(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn remove_blob(&self, key: &str) -> Result<(), StatsError> {
        let path = self.blob_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to remove statistics blob");
                Err(StatsError::storage(e.to_string()))
            }
        }
    }
}

/// PostgreSQL implementation storing blobs in a key/value table
pub struct PostgresStatsRepository {
    pool: PgPool,
}

impl PostgresStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the blob table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StatsError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS stats_blobs (key TEXT PRIMARY KEY, payload TEXT NOT NULL, updated_at TIMESTAMPTZ NOT NULL)"
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create stats_blobs table");
            StatsError::storage(e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for PostgresStatsRepository {
    #[instrument(skip(self))]
    async fn load_blob(&self, key: &str) -> Result<Option<String>, StatsError> {
        debug!(key = %key, "Fetching statistics blob from database");

        let row = sqlx::query("SELECT payload FROM stats_blobs WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to fetch statistics blob from database");
                StatsError::storage(e.to_string())
            })?;

        Ok(row.map(|row| row.get("payload")))
    }

    #[instrument(skip(self, blob))]
    async fn store_blob(&self, key: &str, blob: String) -> Result<(), StatsError> {
        debug!(key = %key, bytes = blob.len(), "Upserting statistics blob in database");

        sqlx::query(
            "INSERT INTO stats_blobs (key, payload, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO UPDATE SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at"
        )
        .bind(key)
        .bind(&blob)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, key = %key, "Failed to store statistics blob in database");
            StatsError::storage(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_blob(&self, key: &str) -> Result<(), StatsError> {
        sqlx::query("DELETE FROM stats_blobs WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to delete statistics blob from database");
                StatsError::storage(e.to_string())
            })?;
        Ok(())
    }
}
