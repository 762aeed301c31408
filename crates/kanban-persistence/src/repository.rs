use crate::serialization::JsonSerializer;
use crate::store::JsonFileStore;
use crate::traits::{PersistenceMetadata, PersistenceStore, Serializer, StoreSnapshot};
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::BoardSnapshot;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Typed access to the persisted board snapshot.
pub struct BoardRepository {
    store: JsonFileStore,
    serializer: JsonSerializer,
}

impl BoardRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            store: JsonFileStore::new(path),
            serializer: JsonSerializer,
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Loads the persisted board, falling back to the default board when the
    /// file is missing or unreadable as a snapshot.
    pub async fn load_or_default(&self) -> KanbanResult<BoardSnapshot> {
        if !self.store.exists().await {
            tracing::info!(
                "No snapshot at {}, starting from the default board",
                self.path().display()
            );
            return Ok(BoardSnapshot::default());
        }

        match self.load().await {
            Ok(snapshot) => Ok(snapshot),
            Err(KanbanError::Serialization(reason)) => {
                tracing::warn!(
                    "Snapshot at {} is unreadable ({}), using the default board",
                    self.path().display(),
                    reason
                );
                Ok(BoardSnapshot::default())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn load(&self) -> KanbanResult<BoardSnapshot> {
        let (snapshot, _metadata) = self.store.load().await?;
        self.serializer.deserialize(&snapshot.data)
    }

    pub async fn save(&self, snapshot: &BoardSnapshot) -> KanbanResult<()> {
        let data = self.serializer.serialize(snapshot)?;
        self.store
            .save(StoreSnapshot {
                data,
                metadata: PersistenceMetadata::new(self.store.instance_id()),
            })
            .await?;
        Ok(())
    }

    /// Persists every snapshot queued on `rx` until all senders are dropped.
    /// When several snapshots are queued only the latest is written.
    pub fn spawn_writer(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<BoardSnapshot>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(mut snapshot) = rx.recv().await {
                let mut skipped = 0usize;
                while let Ok(newer) = rx.try_recv() {
                    snapshot = newer;
                    skipped += 1;
                }
                if skipped > 0 {
                    tracing::debug!("Coalesced {} queued snapshots", skipped);
                }
                if let Err(e) = self.save(&snapshot).await {
                    tracing::error!("Failed to persist board snapshot: {}", e);
                }
            }
            tracing::debug!("Snapshot writer stopped");
        })
    }
}
