//! Batched creation of checklist items.
//!
//! Submitted items show up immediately with a temporary id and are sent to
//! the remote service once the user has been quiet for a while. One timer is
//! shared by all checklists; every submission restarts it.

use futures::future::join_all;
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::{CardId, ChecklistId, ChecklistItem, ItemId};
use kanban_remote::{mapper, TaskService};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::notify::Notifier;
use crate::state::SharedStore;

#[derive(Debug, Clone)]
struct PendingItem {
    /// Temporary id of the visible item.
    correlation: ItemId,
    text: String,
}

#[derive(Debug, Clone)]
struct PendingBatch {
    card_id: CardId,
    items: Vec<PendingItem>,
}

#[derive(Default)]
struct QueueState {
    pending: HashMap<ChecklistId, PendingBatch>,
    in_flight: HashSet<ItemId>,
    cancelled: HashSet<ItemId>,
}

/// A checklist item whose creation failed during a flush.
#[derive(Debug)]
pub struct FailedItem {
    pub checklist_id: ChecklistId,
    pub text: String,
    pub error: KanbanError,
}

#[derive(Debug, Default)]
pub struct FlushReport {
    pub created: usize,
    pub failed: Vec<FailedItem>,
    /// Items discarded while their creation was in flight.
    pub cancelled: usize,
    /// Cards whose checklists were refreshed from the remote service.
    pub refreshed: Vec<CardId>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.failed.is_empty() && self.cancelled == 0
    }

    fn merge(&mut self, other: FlushReport) {
        self.created += other.created;
        self.failed.extend(other.failed);
        self.cancelled += other.cancelled;
    }
}

struct QueueInner {
    store: SharedStore,
    remote: Arc<dyn TaskService>,
    notifier: Notifier,
    quiet_period: Duration,
    state: Mutex<QueueState>,
    timer: Mutex<Option<JoinHandle<()>>>,
    /// Held for the whole of a flush, so flushes never overlap.
    flushing: tokio::sync::Mutex<()>,
}

#[derive(Clone)]
pub struct ChecklistQueue {
    inner: Arc<QueueInner>,
}

impl ChecklistQueue {
    pub fn new(
        store: SharedStore,
        remote: Arc<dyn TaskService>,
        notifier: Notifier,
        quiet_period: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                remote,
                notifier,
                quiet_period,
                state: Mutex::new(QueueState::default()),
                timer: Mutex::new(None),
                flushing: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Adds a temporary item to the checklist and queues its creation.
    /// Returns the temporary id.
    pub fn submit(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        text: &str,
    ) -> KanbanResult<ItemId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KanbanError::Validation(
                "checklist item text must not be empty".to_string(),
            ));
        }
        if card_id.is_temporary() {
            return Err(KanbanError::Validation(format!(
                "card {} is not saved yet",
                card_id
            )));
        }

        let item = {
            let mut store = self.inner.store.lock();
            let checklist = store
                .board()
                .card(card_id)
                .ok_or_else(|| KanbanError::NotFound(format!("card {}", card_id)))?
                .checklist(checklist_id)
                .ok_or_else(|| KanbanError::NotFound(format!("checklist {}", checklist_id)))?;
            let item = ChecklistItem::temporary(text.to_string(), checklist.items.len() as f64);
            let appended = item.clone();
            store.update_card(card_id, |card| {
                card.with_checklist_updated(checklist_id, |c| c.with_item_appended(appended.clone()))
            })?;
            item
        };

        {
            let mut state = self.inner.state.lock();
            state
                .pending
                .entry(checklist_id.clone())
                .or_insert_with(|| PendingBatch {
                    card_id: card_id.clone(),
                    items: Vec::new(),
                })
                .items
                .push(PendingItem {
                    correlation: item.id.clone(),
                    text: text.to_string(),
                });
        }
        tracing::debug!("Queued checklist item {} on {}", item.id, checklist_id);

        self.restart_timer();
        Ok(item.id)
    }

    /// Drops a temporary item. If its creation is already in flight, the
    /// remote item is deleted once it exists. Returns whether the item was
    /// known to the queue.
    pub fn discard(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        item_id: &ItemId,
    ) -> KanbanResult<bool> {
        let known = {
            let mut state = self.inner.state.lock();
            let mut removed = false;
            if let Some(batch) = state.pending.get_mut(checklist_id) {
                let before = batch.items.len();
                batch.items.retain(|p| &p.correlation != item_id);
                removed = batch.items.len() < before;
                if batch.items.is_empty() {
                    state.pending.remove(checklist_id);
                }
            }
            if !removed && state.in_flight.contains(item_id) {
                state.cancelled.insert(item_id.clone());
                removed = true;
            }
            removed
        };

        self.inner.store.lock().update_card(card_id, |card| {
            card.with_checklist_updated(checklist_id, |c| c.without_item(item_id))
        })?;
        Ok(known)
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .pending
            .values()
            .map(|b| b.items.len())
            .sum()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.inner.state.lock();
        state.pending.is_empty() && state.in_flight.is_empty()
    }

    /// Sends every pending item now instead of waiting for the timer. A
    /// flush the timer already started is waited for first; its items are
    /// counted in its own report, not this one.
    pub async fn flush(&self) -> FlushReport {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
        self.inner.clone().flush().await
    }

    fn restart_timer(&self) {
        let inner = self.inner.clone();
        let quiet_period = inner.quiet_period;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // detached so a later restart cannot abort a running flush
            tokio::spawn(async move {
                let report = inner.flush().await;
                if !report.is_empty() {
                    tracing::info!(
                        "Checklist flush: {} created, {} failed, {} cancelled",
                        report.created,
                        report.failed.len(),
                        report.cancelled
                    );
                }
            });
        });
        if let Some(previous) = self.inner.timer.lock().replace(handle) {
            previous.abort();
        }
    }
}

impl QueueInner {
    async fn flush(self: Arc<Self>) -> FlushReport {
        let _running = self.flushing.lock().await;
        let batches: Vec<(ChecklistId, PendingBatch)> = {
            let mut state = self.state.lock();
            let taken: Vec<_> = state.pending.drain().collect();
            for (_, batch) in &taken {
                for item in &batch.items {
                    state.in_flight.insert(item.correlation.clone());
                }
            }
            taken
        };
        if batches.is_empty() {
            return FlushReport::default();
        }
        tracing::debug!("Flushing {} checklist batches", batches.len());

        let mut cards: Vec<CardId> = Vec::new();
        for (_, batch) in &batches {
            if !cards.contains(&batch.card_id) {
                cards.push(batch.card_id.clone());
            }
        }

        let results = join_all(
            batches
                .into_iter()
                .map(|(checklist_id, batch)| self.flush_checklist(checklist_id, batch)),
        )
        .await;

        let mut report = FlushReport::default();
        for result in results {
            report.merge(result);
        }

        for card_id in cards {
            if self.refresh_checklists(&card_id).await {
                report.refreshed.push(card_id);
            }
        }
        report
    }

    /// Creates one checklist's items in submission order.
    async fn flush_checklist(&self, checklist_id: ChecklistId, batch: PendingBatch) -> FlushReport {
        let mut report = FlushReport::default();
        let Some(remote_card) = batch.card_id.as_remote().map(str::to_string) else {
            return report;
        };
        let base = self
            .store
            .lock()
            .board()
            .card(&batch.card_id)
            .and_then(|card| card.checklist(&checklist_id))
            .map(|c| c.confirmed_len())
            .unwrap_or(0);

        for (position, pending) in batch.items.into_iter().enumerate() {
            if self.take_cancelled(&pending.correlation) {
                tracing::debug!("Skipping discarded item {}", pending.correlation);
                self.state.lock().in_flight.remove(&pending.correlation);
                continue;
            }

            let order_index = (base + position) as f64;
            let result = self
                .remote
                .create_checklist_item(&checklist_id, &pending.text, Some(order_index))
                .await;
            self.state.lock().in_flight.remove(&pending.correlation);

            match result {
                Ok(created) => {
                    if self.take_cancelled(&pending.correlation) {
                        if let Err(e) = self
                            .remote
                            .delete_checklist_item(&checklist_id, &created.id)
                            .await
                        {
                            tracing::warn!(
                                "Failed to delete discarded checklist item {}: {}",
                                created.id,
                                e
                            );
                        }
                        report.cancelled += 1;
                        continue;
                    }
                    let confirmed = mapper::to_checklist_item(&created, base + position);
                    self.replace_item(&batch.card_id, &checklist_id, &pending.correlation, confirmed);
                    report.created += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        "Dropping checklist item '{}' on task {}: {}",
                        pending.text,
                        remote_card,
                        error
                    );
                    self.notifier.error(
                        "Add checklist item",
                        format!("'{}' was not saved: {}", pending.text, error),
                    );
                    self.remove_item(&batch.card_id, &checklist_id, &pending.correlation);
                    report.failed.push(FailedItem {
                        checklist_id: checklist_id.clone(),
                        text: pending.text,
                        error,
                    });
                }
            }
        }
        report
    }

    fn take_cancelled(&self, item_id: &ItemId) -> bool {
        self.state.lock().cancelled.remove(item_id)
    }

    fn replace_item(
        &self,
        card_id: &CardId,
        checklist_id: &ChecklistId,
        item_id: &ItemId,
        item: ChecklistItem,
    ) {
        let result = self.store.lock().update_card(card_id, |card| {
            card.with_checklist_updated(checklist_id, |c| c.with_item_replaced(item_id, item.clone()))
        });
        if let Err(e) = result {
            tracing::debug!("Created item {} has no local card: {}", item_id, e);
        }
    }

    fn remove_item(&self, card_id: &CardId, checklist_id: &ChecklistId, item_id: &ItemId) {
        let result = self.store.lock().update_card(card_id, |card| {
            card.with_checklist_updated(checklist_id, |c| c.without_item(item_id))
        });
        if let Err(e) = result {
            tracing::debug!("Failed item {} has no local card: {}", item_id, e);
        }
    }

    /// Replaces a card's checklists with the remote ones, keeping temporary
    /// items that belong to a newer batch.
    async fn refresh_checklists(&self, card_id: &CardId) -> bool {
        let Some(task_id) = card_id.as_remote() else {
            return false;
        };
        let task = match self.remote.get_task(task_id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!("Could not refresh checklists of task {}: {}", task_id, e);
                return false;
            }
        };
        let fetched = mapper::to_card(&task);

        let waiting: HashSet<ItemId> = {
            let state = self.state.lock();
            state
                .pending
                .values()
                .flat_map(|b| b.items.iter().map(|p| p.correlation.clone()))
                .chain(state.in_flight.iter().cloned())
                .collect()
        };

        let result = self.store.lock().update_card(card_id, |card| {
            let checklists = fetched
                .checklists
                .iter()
                .map(|remote| {
                    let still_waiting = card
                        .checklist(&remote.id)
                        .map(|local| {
                            local
                                .items
                                .iter()
                                .filter(|item| waiting.contains(&item.id))
                                .cloned()
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default();
                    still_waiting
                        .into_iter()
                        .fold(remote.clone(), |c, item| c.with_item_appended(item))
                })
                .collect();
            card.with_checklists(checklists)
        });
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Refreshed task {} is no longer on the board: {}", task_id, e);
                false
            }
        }
    }
}
