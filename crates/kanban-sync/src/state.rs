use chrono::{DateTime, Utc};
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{
    Board, BoardSnapshot, Card, CardId, CardLocation, Column, ColumnId, Label, LabelId,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

pub type SharedStore = Arc<Mutex<BoardStore>>;

/// Holds the current board and replaces it wholesale on every mutation.
///
/// # Save Behavior
///
/// Each successful mutation queues a snapshot on the save channel, if one is
/// attached. The receiving end (`BoardRepository::spawn_writer`) persists
/// them in the background; a mutation never waits for disk.
pub struct BoardStore {
    board: Board,
    pulled_at: Option<DateTime<Utc>>,
    focused_card: Option<CardId>,
    save_tx: Option<mpsc::UnboundedSender<BoardSnapshot>>,
}

impl BoardStore {
    pub fn new(snapshot: BoardSnapshot) -> Self {
        Self {
            board: snapshot.board,
            pulled_at: snapshot.pulled_at,
            focused_card: None,
            save_tx: None,
        }
    }

    pub fn with_saver(snapshot: BoardSnapshot, save_tx: mpsc::UnboundedSender<BoardSnapshot>) -> Self {
        Self {
            save_tx: Some(save_tx),
            ..Self::new(snapshot)
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pulled_at(&self) -> Option<DateTime<Utc>> {
        self.pulled_at
    }

    /// The current board value, for rollback or inspection.
    pub fn snapshot(&self) -> Board {
        self.board.clone()
    }

    /// Puts a previously taken snapshot back.
    pub fn restore(&mut self, board: Board) {
        tracing::debug!("Restoring board snapshot");
        self.commit(board);
    }

    /// Replaces the board with one freshly pulled from the remote service.
    pub fn replace_board(&mut self, board: Board) {
        self.pulled_at = Some(Utc::now());
        if let Some(id) = &self.focused_card {
            if board.card(id).is_none() {
                self.focused_card = None;
            }
        }
        self.commit(board);
    }

    pub fn to_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            board: self.board.clone(),
            pulled_at: self.pulled_at,
        }
    }

    pub fn add_column(&mut self, title: &str) -> KanbanResult<ColumnId> {
        let title = non_empty(title, "column title")?;
        let column = Column::local(title);
        let id = column.id.clone();
        let board = self.board.with_column_added(column)?;
        self.commit(board);
        Ok(id)
    }

    pub fn remove_column(&mut self, column_id: &str) -> KanbanResult<()> {
        let board = self.board.without_column(column_id)?;
        self.commit(board);
        Ok(())
    }

    /// Adds a card with a temporary id to the end of a column.
    pub fn add_card(&mut self, column_id: &str, title: &str) -> KanbanResult<Card> {
        let title = non_empty(title, "card title")?;
        let card = Card::temporary(title, column_id.to_string());
        let board = self.board.with_card_added(column_id, card.clone())?;
        self.commit(board);
        Ok(card)
    }

    pub fn insert_card(&mut self, location: &CardLocation, card: Card) -> KanbanResult<()> {
        let board = self.board.with_card_inserted(location, card)?;
        self.commit(board);
        Ok(())
    }

    /// Returns `false` when source and target are the same column, in which
    /// case nothing changes.
    pub fn move_card(&mut self, card_id: &CardId, from: &str, to: &str) -> KanbanResult<bool> {
        if from == to {
            return Ok(false);
        }
        let board = self.board.with_card_moved(card_id, from, to)?;
        self.commit(board);
        Ok(true)
    }

    /// Substitutes the card with the same id. An unknown id is logged and
    /// ignored.
    pub fn replace_card(&mut self, card: Card) -> bool {
        let id = card.id.clone();
        match self.board.with_card_replaced(card) {
            Some(board) => {
                self.commit(board);
                true
            }
            None => {
                tracing::warn!("Ignoring replacement for unknown card {}", id);
                false
            }
        }
    }

    /// Swaps a card for its confirmed version, which may carry a new id.
    pub fn reconcile_card(&mut self, old_id: &CardId, card: Card) -> bool {
        let new_id = card.id.clone();
        match self.board.with_card_swapped(old_id, card) {
            Some(board) => {
                if self.focused_card.as_ref() == Some(old_id) {
                    self.focused_card = Some(new_id);
                }
                self.commit(board);
                true
            }
            None => {
                tracing::warn!("Card {} disappeared before it could be reconciled", old_id);
                false
            }
        }
    }

    pub fn update_card<F>(&mut self, card_id: &CardId, update: F) -> KanbanResult<Card>
    where
        F: FnOnce(&Card) -> Card,
    {
        let board = self
            .board
            .with_card_updated(card_id, update)
            .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))?;
        let card = board
            .card(card_id)
            .cloned()
            .ok_or_else(|| KanbanError::Internal(format!("card {} lost its id", card_id)))?;
        self.commit(board);
        Ok(card)
    }

    /// Removes a card and closes it if it was open. Returns the card and its
    /// old location.
    pub fn remove_card(&mut self, card_id: &CardId) -> Option<(Card, CardLocation)> {
        let (board, card, location) = self.board.without_card(card_id)?;
        if self.focused_card.as_ref() == Some(card_id) {
            self.focused_card = None;
        }
        self.commit(board);
        Some((card, location))
    }

    /// Puts `card` back at `location`, replacing whatever version of it is
    /// on the board now.
    pub fn restore_card(&mut self, card: Card, location: &CardLocation) -> KanbanResult<()> {
        let board = match self.board.without_card(&card.id) {
            Some((board, _, _)) => board,
            None => self.board.clone(),
        };
        let target = match &location.column_id {
            Some(column_id) if board.column(column_id).is_none() => CardLocation {
                column_id: None,
                index: board.unassigned.len(),
            },
            _ => location.clone(),
        };
        let board = board.with_card_inserted(&target, card)?;
        self.commit(board);
        Ok(())
    }

    /// Adds a label to the catalog, or returns the existing one with the
    /// same name and color.
    pub fn create_label(&mut self, name: &str, color: Option<&str>) -> KanbanResult<Label> {
        let name = non_empty(name, "label name")?;
        let label = match color.map(str::trim).filter(|c| !c.is_empty()) {
            Some(color) => Label::new(name, color.to_string()),
            None => Label::with_default_color(name),
        };
        if let Some(existing) = self.board.label(label.id) {
            return Ok(existing.clone());
        }
        let board = self.board.with_labels_merged([&label]);
        self.commit(board);
        Ok(label)
    }

    pub fn delete_label(&mut self, label_id: LabelId) -> KanbanResult<Label> {
        let label = self
            .board
            .label(label_id)
            .cloned()
            .ok_or_else(|| KanbanError::NotFound(format!("label {}", label_id)))?;
        let board = self.board.without_label(label_id);
        self.commit(board);
        Ok(label)
    }

    /// Toggles a catalog label on a card. Returns whether the card now
    /// carries it.
    pub fn toggle_label(&mut self, card_id: &CardId, label_id: LabelId) -> KanbanResult<bool> {
        let label = self
            .board
            .label(label_id)
            .cloned()
            .ok_or_else(|| KanbanError::NotFound(format!("label {}", label_id)))?;
        let card = self.update_card(card_id, |card| card.with_label_toggled(&label))?;
        Ok(card.has_label(label_id))
    }

    pub fn focus_card(&mut self, card_id: &CardId) -> KanbanResult<()> {
        if self.board.card(card_id).is_none() {
            return Err(KanbanError::NotFound(format!("card {}", card_id)));
        }
        self.focused_card = Some(card_id.clone());
        Ok(())
    }

    pub fn focused_card(&self) -> Option<&CardId> {
        self.focused_card.as_ref()
    }

    pub fn close_card(&mut self) {
        self.focused_card = None;
    }

    /// Drops the save channel so the background writer can finish. Called on
    /// shutdown before awaiting the writer.
    pub fn detach_saver(&mut self) {
        self.save_tx = None;
    }

    pub fn has_saver(&self) -> bool {
        self.save_tx.is_some()
    }

    fn commit(&mut self, board: Board) {
        self.board = board;
        if let Some(ref tx) = self.save_tx {
            if let Err(e) = tx.send(self.to_snapshot()) {
                tracing::error!("Failed to queue save: channel closed: {:?}", e);
            }
        }
    }
}

fn non_empty(value: &str, what: &str) -> KanbanResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}
