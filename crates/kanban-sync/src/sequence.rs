use kanban_domain::CardId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Orders mutations per card so that a late completion cannot overwrite the
/// effect of a newer mutation on the same card.
///
/// Numbers come from one process-wide counter, so they are monotonic per
/// card as well.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    counter: AtomicU64,
    /// Completions numbered below this were issued before the last full
    /// reload and are stale for every card.
    floor: AtomicU64,
    latest: Mutex<HashMap<CardId, u64>>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a mutation on `card_id` and returns its sequence number.
    pub fn begin(&self, card_id: &CardId) -> u64 {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.lock().insert(card_id.clone(), seq);
        seq
    }

    /// Whether `seq` is still the newest mutation applied to `card_id`.
    pub fn is_latest(&self, card_id: &CardId, seq: u64) -> bool {
        if seq < self.floor.load(Ordering::SeqCst) {
            return false;
        }
        self.latest.lock().get(card_id).map_or(true, |latest| *latest == seq)
    }

    /// Makes every in-flight completion stale.
    pub fn invalidate_all(&self) {
        let next = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.floor.store(next, Ordering::SeqCst);
        self.latest.lock().clear();
    }

    /// Carries the latest number of a card over to its new id.
    pub fn rename(&self, old_id: &CardId, new_id: &CardId) {
        let mut latest = self.latest.lock();
        if let Some(seq) = latest.remove(old_id) {
            latest.insert(new_id.clone(), seq);
        }
    }

    pub fn forget(&self, card_id: &CardId) {
        self.latest.lock().remove(card_id);
    }
}
