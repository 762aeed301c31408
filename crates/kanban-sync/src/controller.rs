//! Optimistic synchronization of board mutations.
//!
//! Each mutation is applied to the local store first, then sent to the
//! remote service. On success the local state stands (or is reconciled with
//! what the service returned); on failure the user is notified and the
//! configured [`RollbackPolicy`] decides what happens to the local change.
//!
//! A rollback only reverts the fields the failed mutation set, and only if
//! they still hold the values it set. Otherwise a newer change owns them and
//! the card is marked dirty instead.

use chrono::{DateTime, NaiveDate, Utc};
use kanban_core::{KanbanError, KanbanResult, RollbackPolicy, SyncSettings};
use kanban_domain::{
    Board, Card, CardId, CardLocation, Checklist, ChecklistId, ChecklistItem, ColumnId, Comment,
    ItemId, Label, LabelId,
};
use kanban_remote::{mapper, ChecklistItemUpdate, TaskService};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::notify::Notifier;
use crate::queue::ChecklistQueue;
use crate::sequence::SequenceTracker;
use crate::state::{BoardStore, SharedStore};

#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing needed to change.
    NoOp,
    /// Applied locally; nothing to send.
    Local,
    /// The remote service accepted the change.
    Confirmed,
    /// A newer mutation on the same card was applied before this one
    /// completed, so its result was ignored.
    Superseded,
    Failed {
        error: KanbanError,
        rolled_back: bool,
    },
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&KanbanError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A card mutation that has been applied locally and awaits the remote call.
struct InFlight {
    card_id: CardId,
    seq: u64,
    undo: Undo,
}

/// The part of a card an edit replaces.
#[derive(Debug, Clone, PartialEq)]
struct Content {
    title: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
}

impl Content {
    fn of(card: &Card) -> Self {
        Self {
            title: card.title.clone(),
            description: card.description.clone(),
            due_date: card.due_date,
        }
    }

    fn applied_to(&self, card: &Card) -> Card {
        Card {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            ..card.clone()
        }
    }
}

/// What one mutation changed, enough to take back just that change.
enum Undo {
    Move {
        from: CardLocation,
        status_id: Option<ColumnId>,
        to: ColumnId,
    },
    Content {
        before: Content,
        after: Content,
    },
    Removed {
        card: Card,
        location: CardLocation,
    },
    Item {
        checklist_id: ChecklistId,
        before: ChecklistItem,
        after: ChecklistItem,
    },
    ItemRemoved {
        checklist_id: ChecklistId,
        item: ChecklistItem,
        index: usize,
    },
    ChecklistRemoved {
        checklist: Checklist,
        index: usize,
    },
}

impl Undo {
    /// Reverts the change on the card as it is now. Returns `false`, leaving
    /// the card alone, when a newer change replaced what this one set.
    fn apply(self, store: &mut BoardStore, card_id: &CardId) -> KanbanResult<bool> {
        let current = store.board().card(card_id).cloned();
        match self {
            Undo::Move { from, status_id, to } => {
                let Some(mut card) = current else {
                    return Ok(false);
                };
                let still_there = store
                    .board()
                    .column(&to)
                    .is_some_and(|column| column.card(card_id).is_some());
                if !still_there || card.status_id.as_ref() != Some(&to) {
                    return Ok(false);
                }
                card.status_id = status_id;
                store.restore_card(card, &from)?;
            }
            Undo::Content { before, after } => {
                if current.map(|card| Content::of(&card)) != Some(after) {
                    return Ok(false);
                }
                store.update_card(card_id, |card| before.applied_to(card))?;
            }
            Undo::Removed { card, location } => {
                if current.is_some() {
                    return Ok(false);
                }
                store.restore_card(card, &location)?;
            }
            Undo::Item {
                checklist_id,
                before,
                after,
            } => {
                let now = current
                    .as_ref()
                    .and_then(|card| card.checklist(&checklist_id))
                    .and_then(|checklist| checklist.item(&after.id));
                if now != Some(&after) {
                    return Ok(false);
                }
                store.update_card(card_id, |card| {
                    card.with_checklist_updated(&checklist_id, |c| {
                        c.with_item_replaced(&before.id, before.clone())
                    })
                })?;
            }
            Undo::ItemRemoved {
                checklist_id,
                item,
                index,
            } => {
                let Some(checklist) = current.as_ref().and_then(|card| card.checklist(&checklist_id))
                else {
                    return Ok(false);
                };
                if checklist.item(&item.id).is_some() {
                    return Ok(false);
                }
                store.update_card(card_id, |card| {
                    card.with_checklist_updated(&checklist_id, |c| {
                        c.with_item_inserted(index, item.clone())
                    })
                })?;
            }
            Undo::ChecklistRemoved { checklist, index } => {
                if current.map_or(true, |card| card.checklist(&checklist.id).is_some()) {
                    return Ok(false);
                }
                store.update_card(card_id, |card| card.with_checklist_inserted(index, checklist))?;
            }
        }
        Ok(true)
    }
}

pub struct SyncController {
    store: SharedStore,
    remote: Arc<dyn TaskService>,
    notifier: Notifier,
    policy: RollbackPolicy,
    sequences: SequenceTracker,
    dirty: Mutex<HashSet<CardId>>,
    queue: ChecklistQueue,
}

impl SyncController {
    pub fn new(
        store: SharedStore,
        remote: Arc<dyn TaskService>,
        settings: &SyncSettings,
        notifier: Notifier,
    ) -> Self {
        let queue = ChecklistQueue::new(
            store.clone(),
            remote.clone(),
            notifier.clone(),
            settings.quiet_period(),
        );
        Self {
            store,
            remote,
            notifier,
            policy: settings.rollback,
            sequences: SequenceTracker::new(),
            dirty: Mutex::new(HashSet::new()),
            queue,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn queue(&self) -> &ChecklistQueue {
        &self.queue
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    pub fn board(&self) -> Board {
        self.store.lock().snapshot()
    }

    /// Cards whose local state diverged from the remote service: a mutation
    /// failed under [`RollbackPolicy::MarkDirty`], or a newer change kept the
    /// failed one from being rolled back.
    pub fn dirty_cards(&self) -> Vec<CardId> {
        let mut cards: Vec<CardId> = self.dirty.lock().iter().cloned().collect();
        cards.sort();
        cards
    }

    pub fn is_dirty(&self, card_id: &CardId) -> bool {
        self.dirty.lock().contains(card_id)
    }

    /// Replaces the board with the remote list's statuses and tasks. Label
    /// assignments and the label catalog are local and survive the reload.
    pub async fn load_board(&self) -> KanbanResult<SyncOutcome> {
        let fetched = async {
            let statuses = self.remote.list_statuses().await?;
            let tasks = self.remote.list_tasks(true).await?;
            Ok::<_, KanbanError>((statuses, tasks))
        }
        .await;
        let (statuses, tasks) = match fetched {
            Ok(fetched) => fetched,
            Err(error) => {
                self.notifier.error("Load board", error.to_string());
                return Ok(SyncOutcome::Failed {
                    error,
                    rolled_back: false,
                });
            }
        };

        let remote_board = mapper::distribute_cards(
            mapper::to_columns(&statuses),
            tasks.iter().map(mapper::to_card).collect(),
        );
        self.sequences.invalidate_all();
        let (columns, cards) = {
            let mut store = self.store.lock();
            let merged = merge_local(&remote_board, store.board());
            let counts = (merged.columns.len(), merged.cards().count());
            store.replace_board(merged);
            counts
        };
        self.dirty.lock().clear();
        self.notifier
            .info("Load board", format!("{} columns, {} cards", columns, cards));
        Ok(SyncOutcome::Confirmed)
    }

    /// Adds a card with a temporary id, creates the task, then swaps in the
    /// created task. Returns the card's id after the call: the remote id on
    /// success, otherwise the temporary one.
    pub async fn create_card(
        &self,
        column_id: &str,
        title: &str,
    ) -> KanbanResult<(CardId, SyncOutcome)> {
        let (card, status_label) = {
            let mut store = self.store.lock();
            let status_label = store
                .board()
                .column(column_id)
                .map(|c| c.title.clone())
                .ok_or_else(|| KanbanError::NotFound(format!("column {}", column_id)))?;
            (store.add_card(column_id, title)?, status_label)
        };
        let seq = self.sequences.begin(&card.id);

        let task = match self.remote.create_task(&card.title, &status_label).await {
            Ok(task) => task,
            Err(error) => {
                let temp_id = card.id.clone();
                let outcome = self.settle_failure("Create card", &card.id, seq, error, |store| {
                    store.remove_card(&temp_id);
                    Ok(true)
                });
                return Ok((card.id, outcome));
            }
        };

        if !self.sequences.is_latest(&card.id, seq) {
            return Ok((card.id, SyncOutcome::Superseded));
        }
        let confirmed = {
            let mut store = self.store.lock();
            let Some(current) = store.board().card(&card.id).cloned() else {
                tracing::warn!("Created task {} but its card is gone", task.id);
                return Ok((card.id, SyncOutcome::Superseded));
            };
            let mut confirmed = mapper::to_card(&task).merged_with_local(&current);
            confirmed.status_id = current.status_id.clone();
            store.reconcile_card(&card.id, confirmed.clone());
            confirmed
        };
        self.sequences.rename(&card.id, &confirmed.id);
        self.dirty.lock().remove(&card.id);
        self.notifier
            .info("Create card", format!("Created '{}'", confirmed.title));
        Ok((confirmed.id, SyncOutcome::Confirmed))
    }

    /// Moves a card between columns and sets its status to the target
    /// column's title.
    pub async fn move_card(&self, card_id: &CardId, from: &str, to: &str) -> KanbanResult<SyncOutcome> {
        if from == to {
            return Ok(SyncOutcome::NoOp);
        }
        let mut status_label = String::new();
        let (flight, task_id) = self.begin(card_id, |store, before| {
            status_label = store
                .board()
                .column(to)
                .map(|c| c.title.clone())
                .ok_or_else(|| KanbanError::NotFound(format!("column {}", to)))?;
            let location = store
                .board()
                .locate(card_id)
                .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))?;
            store.move_card(card_id, from, to)?;
            Ok(Undo::Move {
                from: location,
                status_id: before.status_id.clone(),
                to: to.to_string(),
            })
        })?;

        let request = mapper::status_update_request(&status_label);
        let call = self.remote.update_task(&task_id, &request);
        Ok(self.confirm("Move card", flight, call).await)
    }

    /// Takes the title, description and due date of `edited` locally and
    /// saves them remotely. Everything else on the card is left as it is.
    pub async fn edit_card(&self, edited: Card) -> KanbanResult<SyncOutcome> {
        let content = Content::of(&edited);
        let (flight, task_id) = self.begin(&edited.id, |store, before| {
            store.update_card(&edited.id, |card| content.applied_to(card))?;
            Ok(Undo::Content {
                before: Content::of(before),
                after: content.clone(),
            })
        })?;

        let request = mapper::to_update_request(&edited);
        let call = self.remote.update_task(&task_id, &request);
        Ok(self.confirm("Edit card", flight, call).await)
    }

    /// Removes a card and closes it if open, then deletes the task. Rolling
    /// back puts the card back where it was.
    pub async fn delete_card(&self, card_id: &CardId) -> KanbanResult<SyncOutcome> {
        let (flight, task_id) = self.begin(card_id, |store, _| {
            let (card, location) = store
                .remove_card(card_id)
                .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))?;
            Ok(Undo::Removed { card, location })
        })?;

        let call = self.remote.delete_task(&task_id);
        let outcome = self.confirm("Delete card", flight, call).await;
        if matches!(outcome, SyncOutcome::Confirmed) {
            self.sequences.forget(card_id);
        }
        Ok(outcome)
    }

    /// Opens a card's detail view and loads its comments.
    pub async fn open_card(&self, card_id: &CardId) -> KanbanResult<SyncOutcome> {
        self.store.lock().focus_card(card_id)?;
        if card_id.is_temporary() {
            return Ok(SyncOutcome::Local);
        }
        self.load_comments(card_id).await
    }

    pub async fn load_comments(&self, card_id: &CardId) -> KanbanResult<SyncOutcome> {
        let task_id = self.remote_id(card_id)?;
        let comments = match self.remote.list_comments(&task_id).await {
            Ok(comments) => comments,
            Err(error) => {
                self.notifier.error("Load comments", error.to_string());
                return Ok(SyncOutcome::Failed {
                    error,
                    rolled_back: false,
                });
            }
        };

        let mut comments: Vec<Comment> = comments.iter().map(mapper::to_comment).collect();
        comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Err(e) = self
            .store
            .lock()
            .update_card(card_id, |card| card.with_comments(comments))
        {
            tracing::warn!("Loaded comments for a card that is gone: {}", e);
        }
        Ok(SyncOutcome::Confirmed)
    }

    /// Posts a comment, then shows it first in the card's comments.
    pub async fn add_comment(&self, card_id: &CardId, text: &str) -> KanbanResult<SyncOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KanbanError::Validation(
                "comment must not be empty".to_string(),
            ));
        }
        let task_id = self.remote_id(card_id)?;
        let created = match self.remote.create_comment(&task_id, text).await {
            Ok(created) => created,
            Err(error) => {
                self.notifier.error("Add comment", error.to_string());
                return Ok(SyncOutcome::Failed {
                    error,
                    rolled_back: false,
                });
            }
        };

        let timestamp = created
            .date
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);
        let comment = Comment::new(created.id, text.to_string(), timestamp, None);
        if let Err(e) = self
            .store
            .lock()
            .update_card(card_id, |card| card.with_comment_prepended(comment))
        {
            tracing::warn!("Comment saved for a card that is gone: {}", e);
        }
        Ok(SyncOutcome::Confirmed)
    }

    /// Creates a checklist remotely and adds it to the card once it exists.
    pub async fn create_checklist(&self, card_id: &CardId, title: &str) -> KanbanResult<SyncOutcome> {
        let title = title.trim();
        if title.is_empty() {
            return Err(KanbanError::Validation(
                "checklist title must not be empty".to_string(),
            ));
        }
        let task_id = self.remote_id(card_id)?;
        let created = match self.remote.create_checklist(&task_id, title).await {
            Ok(created) => created,
            Err(error) => {
                self.notifier.error("Create checklist", error.to_string());
                return Ok(SyncOutcome::Failed {
                    error,
                    rolled_back: false,
                });
            }
        };

        let checklist = mapper::to_checklist(&created);
        if let Err(e) = self
            .store
            .lock()
            .update_card(card_id, |card| card.with_checklist_added(checklist))
        {
            tracing::warn!("Checklist created for a card that is gone: {}", e);
        }
        Ok(SyncOutcome::Confirmed)
    }

    pub async fn delete_checklist(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
    ) -> KanbanResult<SyncOutcome> {
        let (flight, _) = self.begin(card_id, |store, before| {
            let (index, checklist) = before
                .checklists
                .iter()
                .enumerate()
                .find(|(_, c)| &c.id == checklist_id)
                .map(|(index, c)| (index, c.clone()))
                .ok_or_else(|| KanbanError::NotFound(format!("checklist {}", checklist_id)))?;
            store.update_card(card_id, |card| card.without_checklist(checklist_id))?;
            Ok(Undo::ChecklistRemoved { checklist, index })
        })?;

        let call = self.remote.delete_checklist(checklist_id);
        Ok(self.confirm("Delete checklist", flight, call).await)
    }

    /// Queues a new checklist item; see [`ChecklistQueue::submit`].
    pub fn add_checklist_item(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        text: &str,
    ) -> KanbanResult<ItemId> {
        self.queue.submit(card_id, checklist_id, text)
    }

    /// Flips an item's completion. Items not created remotely yet cannot be
    /// toggled.
    pub async fn toggle_checklist_item(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        item_id: &ItemId,
    ) -> KanbanResult<SyncOutcome> {
        let Some(remote_item) = self.remote_item_id(card_id, checklist_id, item_id)? else {
            tracing::debug!("Ignoring toggle of unsaved item {}", item_id);
            return Ok(SyncOutcome::NoOp);
        };

        let mut completed = false;
        let (flight, _) = self.begin(card_id, |store, before| {
            let item = saved_item(before, checklist_id, item_id)?;
            let toggled = ChecklistItem {
                completed: !item.completed,
                ..item.clone()
            };
            completed = toggled.completed;
            replace_item(store, card_id, checklist_id, item, toggled)
        })?;

        let update = ChecklistItemUpdate {
            resolved: Some(completed),
            ..ChecklistItemUpdate::default()
        };
        let call = self
            .remote
            .update_checklist_item(checklist_id, &remote_item, &update);
        Ok(self.confirm("Toggle checklist item", flight, call).await)
    }

    pub async fn rename_checklist_item(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        item_id: &ItemId,
        text: &str,
    ) -> KanbanResult<SyncOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KanbanError::Validation(
                "checklist item text must not be empty".to_string(),
            ));
        }
        let Some(remote_item) = self.remote_item_id(card_id, checklist_id, item_id)? else {
            return Err(KanbanError::Validation(format!(
                "checklist item {} is not saved yet",
                item_id
            )));
        };

        let (flight, _) = self.begin(card_id, |store, before| {
            let item = saved_item(before, checklist_id, item_id)?;
            let renamed = ChecklistItem {
                text: text.to_string(),
                ..item.clone()
            };
            replace_item(store, card_id, checklist_id, item, renamed)
        })?;

        let update = ChecklistItemUpdate {
            name: Some(text.to_string()),
            ..ChecklistItemUpdate::default()
        };
        let call = self
            .remote
            .update_checklist_item(checklist_id, &remote_item, &update);
        Ok(self.confirm("Rename checklist item", flight, call).await)
    }

    /// Deletes an item. Unsaved items are withdrawn from the batch queue;
    /// saved ones are removed locally and deleted remotely right away.
    pub async fn delete_checklist_item(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        item_id: &ItemId,
    ) -> KanbanResult<SyncOutcome> {
        let Some(remote_item) = self.remote_item_id(card_id, checklist_id, item_id)? else {
            self.queue.discard(card_id, checklist_id, item_id)?;
            return Ok(SyncOutcome::Local);
        };

        let (flight, _) = self.begin(card_id, |store, before| {
            let (index, item) = before
                .checklist(checklist_id)
                .and_then(|c| c.items.iter().enumerate().find(|(_, item)| &item.id == item_id))
                .map(|(index, item)| (index, item.clone()))
                .ok_or_else(|| KanbanError::NotFound(format!("checklist item {}", item_id)))?;
            store.update_card(card_id, |card| {
                card.with_checklist_updated(checklist_id, |c| c.without_item(item_id))
            })?;
            Ok(Undo::ItemRemoved {
                checklist_id: checklist_id.clone(),
                item,
                index,
            })
        })?;

        let call = self.remote.delete_checklist_item(checklist_id, &remote_item);
        Ok(self.confirm("Delete checklist item", flight, call).await)
    }

    pub fn create_label(&self, name: &str, color: Option<&str>) -> KanbanResult<Label> {
        self.store.lock().create_label(name, color)
    }

    /// Removes a label from the catalog and from every card.
    pub fn delete_label(&self, label_id: LabelId) -> KanbanResult<SyncOutcome> {
        self.store.lock().delete_label(label_id)?;
        Ok(SyncOutcome::Local)
    }

    /// Returns whether the card carries the label afterwards.
    pub fn toggle_label(&self, card_id: &CardId, label_id: LabelId) -> KanbanResult<bool> {
        self.store.lock().toggle_label(card_id, label_id)
    }

    fn remote_id(&self, card_id: &CardId) -> KanbanResult<String> {
        if self.store.lock().board().card(card_id).is_none() {
            return Err(KanbanError::NotFound(format!("card {}", card_id)));
        }
        card_id
            .as_remote()
            .map(str::to_string)
            .ok_or_else(|| unsaved(card_id))
    }

    /// Remote id of a checklist item, `None` while it only exists locally.
    fn remote_item_id(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        item_id: &ItemId,
    ) -> KanbanResult<Option<String>> {
        let store = self.store.lock();
        let card = store
            .board()
            .card(card_id)
            .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))?;
        let checklist = card
            .checklist(checklist_id)
            .ok_or_else(|| KanbanError::NotFound(format!("checklist {}", checklist_id)))?;
        let item = checklist
            .item(item_id)
            .ok_or_else(|| KanbanError::NotFound(format!("checklist item {}", item_id)))?;
        Ok(item.id.as_remote().map(str::to_string))
    }

    /// Validates and applies a card mutation locally. `apply` sees the card
    /// as it was and returns how to take the change back. Nothing changes
    /// when the card is unknown, still unsaved, or `apply` fails.
    fn begin<F>(&self, card_id: &CardId, apply: F) -> KanbanResult<(InFlight, String)>
    where
        F: FnOnce(&mut BoardStore, &Card) -> KanbanResult<Undo>,
    {
        let mut store = self.store.lock();
        let before = store
            .board()
            .card(card_id)
            .cloned()
            .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))?;
        let task_id = card_id
            .as_remote()
            .map(str::to_string)
            .ok_or_else(|| unsaved(card_id))?;

        let saved = store.snapshot();
        let undo = match apply(&mut *store, &before) {
            Ok(undo) => undo,
            Err(e) => {
                if store.board() != &saved {
                    store.restore(saved);
                }
                return Err(e);
            }
        };
        let flight = InFlight {
            card_id: card_id.clone(),
            seq: self.sequences.begin(card_id),
            undo,
        };
        Ok((flight, task_id))
    }

    async fn confirm<T, Fut>(&self, action: &str, flight: InFlight, call: Fut) -> SyncOutcome
    where
        Fut: Future<Output = KanbanResult<T>>,
    {
        let InFlight { card_id, seq, undo } = flight;
        match call.await {
            Ok(_) => self.settle_success(&card_id, seq),
            Err(error) => {
                let target = card_id.clone();
                self.settle_failure(action, &card_id, seq, error, move |store| {
                    undo.apply(store, &target)
                })
            }
        }
    }

    fn settle_success(&self, card_id: &CardId, seq: u64) -> SyncOutcome {
        if !self.sequences.is_latest(card_id, seq) {
            tracing::debug!("Ignoring stale completion #{} for card {}", seq, card_id);
            return SyncOutcome::Superseded;
        }
        self.dirty.lock().remove(card_id);
        SyncOutcome::Confirmed
    }

    /// Every failure is reported. `undo` returns whether it could revert the
    /// change; when it could not, or the policy keeps local changes, the card
    /// is marked dirty.
    fn settle_failure<F>(
        &self,
        action: &str,
        card_id: &CardId,
        seq: u64,
        error: KanbanError,
        undo: F,
    ) -> SyncOutcome
    where
        F: FnOnce(&mut BoardStore) -> KanbanResult<bool>,
    {
        self.notifier.error(action, error.to_string());
        if !self.sequences.is_latest(card_id, seq) {
            tracing::warn!(
                "{} failed for card {} after a newer change: {}",
                action,
                card_id,
                error
            );
        }

        let rolled_back = match self.policy {
            RollbackPolicy::Rollback => match undo(&mut *self.store.lock()) {
                Ok(true) => true,
                Ok(false) => {
                    tracing::debug!("{} on card {} was overtaken; not rolling back", action, card_id);
                    false
                }
                Err(e) => {
                    tracing::error!("Could not roll back {} on card {}: {}", action, card_id, e);
                    false
                }
            },
            RollbackPolicy::MarkDirty => false,
        };
        if !rolled_back {
            self.dirty.lock().insert(card_id.clone());
        }
        SyncOutcome::Failed { error, rolled_back }
    }
}

/// The saved item a toggle or rename starts from.
fn saved_item<'a>(
    card: &'a Card,
    checklist_id: &ChecklistId,
    item_id: &ItemId,
) -> KanbanResult<&'a ChecklistItem> {
    card.checklist(checklist_id)
        .and_then(|c| c.item(item_id))
        .ok_or_else(|| KanbanError::NotFound(format!("checklist item {}", item_id)))
}

fn replace_item(
    store: &mut BoardStore,
    card_id: &CardId,
    checklist_id: &ChecklistId,
    before: &ChecklistItem,
    after: ChecklistItem,
) -> KanbanResult<Undo> {
    store.update_card(card_id, |card| {
        card.with_checklist_updated(checklist_id, |c| c.with_item_replaced(&before.id, after.clone()))
    })?;
    Ok(Undo::Item {
        checklist_id: checklist_id.clone(),
        before: before.clone(),
        after,
    })
}

fn unsaved(card_id: &CardId) -> KanbanError {
    KanbanError::Validation(format!(
        "card {} is not saved yet; wait for it to be created",
        card_id
    ))
}

/// Keeps local-only data of cards that exist in both boards. The label
/// catalog is local, so labels that only came from tags stay in it after
/// the tags are gone.
fn merge_local(remote: &Board, local: &Board) -> Board {
    let merge = |card: &Card| match local.card(&card.id) {
        Some(existing) => card.merged_with_local(existing),
        None => card.clone(),
    };
    Board {
        columns: remote
            .columns
            .iter()
            .map(|column| column.with_cards(column.cards.iter().map(&merge).collect()))
            .collect(),
        unassigned: remote.unassigned.iter().map(&merge).collect(),
        labels: remote.labels.clone(),
    }
    .with_labels_merged(local.labels.iter())
}
