use kanban_core::{KanbanError, KanbanResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes board files so a reader never sees a half-written snapshot: the
/// bytes go to a sibling temp file, are synced, then renamed over the target.
pub struct AtomicWriter;

impl AtomicWriter {
    pub async fn write_atomic(path: &Path, data: &[u8]) -> KanbanResult<()> {
        // the temp file must be on the target's filesystem for rename to be atomic
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).await?;

        let target = path.to_path_buf();
        let bytes = data.to_vec();
        let written = bytes.len();
        tokio::task::spawn_blocking(move || -> KanbanResult<()> {
            let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
            temp.write_all(&bytes)?;
            temp.as_file().sync_all()?;
            temp.persist(&target).map_err(|e| KanbanError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| KanbanError::Internal(format!("snapshot write task failed: {}", e)))??;

        tracing::debug!("Atomically wrote {} bytes to {}", written, path.display());
        Ok(())
    }

    pub async fn read_all(path: &Path) -> KanbanResult<Vec<u8>> {
        let data = fs::read(path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }
}
