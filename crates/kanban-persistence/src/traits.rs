use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kanban_core::KanbanResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

pub const FORMAT_VERSION: u32 = 1;

/// Envelope header written next to every board snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceMetadata {
    pub format_version: u32,
    /// Process that wrote the file.
    pub instance_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

impl PersistenceMetadata {
    pub fn new(instance_id: Uuid) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            instance_id,
            saved_at: Utc::now(),
        }
    }
}

/// Serialized board bytes plus their envelope header, as handed to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub data: Vec<u8>,
    pub metadata: PersistenceMetadata,
}

/// Where board snapshots live. Saving replaces the previous snapshot
/// wholesale; there is no history.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Returns the header actually written, with the store's instance id and
    /// the save time filled in.
    async fn save(&self, snapshot: StoreSnapshot) -> KanbanResult<PersistenceMetadata>;

    async fn load(&self) -> KanbanResult<(StoreSnapshot, PersistenceMetadata)>;

    async fn exists(&self) -> bool;

    fn path(&self) -> &Path;
}

/// Converts a typed value to and from the bytes inside a [`StoreSnapshot`].
pub trait Serializer<T: Send + Sync>: Send + Sync {
    fn serialize(&self, data: &T) -> KanbanResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> KanbanResult<T>;
}
