use crate::store::atomic_writer::AtomicWriter;
use crate::traits::{PersistenceMetadata, PersistenceStore, StoreSnapshot, FORMAT_VERSION};
use kanban_core::{KanbanError, KanbanResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Board snapshot file: `{ "version": 1, "metadata": {..}, "data": {..} }`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    instance_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonEnvelope {
    version: u32,
    metadata: PersistenceMetadata,
    data: serde_json::Value,
}

fn json_error(e: serde_json::Error) -> KanbanError {
    KanbanError::Serialization(e.to_string())
}

impl JsonEnvelope {
    fn wrap(snapshot: &StoreSnapshot) -> KanbanResult<Self> {
        Ok(Self {
            version: FORMAT_VERSION,
            metadata: snapshot.metadata.clone(),
            data: serde_json::from_slice(&snapshot.data).map_err(json_error)?,
        })
    }

    fn into_snapshot(self) -> KanbanResult<StoreSnapshot> {
        if self.version != FORMAT_VERSION {
            return Err(KanbanError::Serialization(format!(
                "Unsupported format version: {}",
                self.version
            )));
        }
        Ok(StoreSnapshot {
            data: serde_json::to_vec(&self.data).map_err(json_error)?,
            metadata: self.metadata,
        })
    }
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            instance_id: Uuid::new_v4(),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }
}

#[async_trait::async_trait]
impl PersistenceStore for JsonFileStore {
    async fn save(&self, mut snapshot: StoreSnapshot) -> KanbanResult<PersistenceMetadata> {
        snapshot.metadata.instance_id = self.instance_id;
        snapshot.metadata.saved_at = chrono::Utc::now();

        let bytes = serde_json::to_vec_pretty(&JsonEnvelope::wrap(&snapshot)?).map_err(json_error)?;
        AtomicWriter::write_atomic(&self.path, &bytes).await?;
        tracing::info!("Saved board ({} bytes) to {}", bytes.len(), self.path.display());

        Ok(snapshot.metadata)
    }

    async fn load(&self) -> KanbanResult<(StoreSnapshot, PersistenceMetadata)> {
        let bytes = AtomicWriter::read_all(&self.path).await?;
        let envelope: JsonEnvelope = serde_json::from_slice(&bytes).map_err(json_error)?;
        let snapshot = envelope.into_snapshot()?;
        tracing::info!("Loaded board ({} bytes) from {}", bytes.len(), self.path.display());

        let metadata = snapshot.metadata.clone();
        Ok((snapshot, metadata))
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
