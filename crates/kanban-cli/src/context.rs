use anyhow::anyhow;
use kanban_core::{AppConfig, KanbanError, KanbanResult};
use kanban_domain::{Board, Card, CardId, EntityId};
use kanban_persistence::BoardRepository;
use kanban_remote::ClickUpClient;
use kanban_sync::{BoardStore, Notifier, SyncController, SyncOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything a board command needs: the controller wired to the remote
/// list, and the background writer persisting each committed snapshot.
pub struct CliContext {
    controller: SyncController,
    writer: JoinHandle<()>,
}

impl CliContext {
    pub async fn load(file_path: &str, config: &AppConfig) -> KanbanResult<Self> {
        let repository = Arc::new(BoardRepository::new(file_path));
        let snapshot = repository.load_or_default().await?;

        let (save_tx, save_rx) = mpsc::unbounded_channel();
        let writer = repository.spawn_writer(save_rx);
        let store = BoardStore::with_saver(snapshot, save_tx).shared();
        let remote = Arc::new(ClickUpClient::new(config.remote.clone()));
        let controller = SyncController::new(store, remote, &config.sync, Notifier::new());

        Ok(Self { controller, writer })
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    pub fn board(&self) -> Board {
        self.controller.board()
    }

    /// Resolves user input to a card on the board.
    pub fn card_id(&self, input: &str) -> KanbanResult<CardId> {
        let id = EntityId::parse(input.trim());
        if self.controller.board().card(&id).is_none() {
            return Err(KanbanError::NotFound(format!("card {}", input)));
        }
        Ok(id)
    }

    pub fn card(&self, card_id: &CardId) -> KanbanResult<Card> {
        self.controller
            .board()
            .card(card_id)
            .cloned()
            .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))
    }

    /// Sends any queued checklist items, then waits until the last snapshot
    /// is on disk.
    pub async fn finish(self) -> anyhow::Result<()> {
        let report = self.controller.queue().flush().await;
        if !report.is_empty() {
            tracing::info!(
                "Final flush: {} created, {} failed",
                report.created,
                report.failed.len()
            );
        }
        self.controller.store().lock().detach_saver();
        drop(self.controller);
        self.writer.await?;
        Ok(())
    }
}

/// Turns a sync outcome into the status reported to the user, or an error
/// when the remote call failed.
pub fn settle(outcome: SyncOutcome) -> anyhow::Result<&'static str> {
    match outcome {
        SyncOutcome::NoOp => Ok("unchanged"),
        SyncOutcome::Local => Ok("local"),
        SyncOutcome::Confirmed => Ok("confirmed"),
        SyncOutcome::Superseded => Ok("superseded"),
        SyncOutcome::Failed {
            error,
            rolled_back: true,
        } => Err(anyhow!("{} (local change rolled back)", error)),
        SyncOutcome::Failed {
            error,
            rolled_back: false,
        } => Err(anyhow!("{} (local change kept, card marked dirty)", error)),
    }
}
