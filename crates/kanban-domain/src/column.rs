use crate::card::Card;
use crate::id::CardId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Columns mirror remote statuses, so their id is the status id.
pub type ColumnId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(id: ColumnId, title: String) -> Self {
        Self {
            id,
            title,
            color: None,
            cards: Vec::new(),
        }
    }

    /// Column that exists only on this board, not as a remote status.
    pub fn local(title: String) -> Self {
        Self::new(format!("col-{}", Uuid::new_v4()), title)
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|card| &card.id == card_id)
    }

    pub fn position_of(&self, card_id: &CardId) -> Option<usize> {
        self.cards.iter().position(|card| &card.id == card_id)
    }

    pub fn with_cards(&self, cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..self.clone()
        }
    }
}
