//! The board value and its copy-on-write mutations.
//!
//! Every mutation returns a new `Board`; the receiver is never modified.
//! This keeps snapshots and rollbacks trivial: holding on to the previous
//! value is enough to restore it.

use kanban_core::{KanbanError, KanbanResult};
use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::column::{Column, ColumnId};
use crate::id::CardId;
use crate::label::{Label, LabelId};

/// Where a card sits on the board. `column_id` is `None` for cards in the
/// unassigned bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLocation {
    pub column_id: Option<ColumnId>,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Cards whose status matches no column.
    #[serde(default)]
    pub unassigned: Vec<Card>,
    /// Label catalog shared by all cards.
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Board {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            unassigned: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Board used when nothing has been persisted yet.
    pub fn default_board() -> Self {
        Self::new(vec![
            Column::new("col-1".to_string(), "To Do".to_string()),
            Column::new("col-2".to_string(), "In Progress".to_string()),
            Column::new("col-3".to_string(), "Done".to_string()),
        ])
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .chain(self.unassigned.iter())
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards().find(|card| &card.id == card_id)
    }

    pub fn locate(&self, card_id: &CardId) -> Option<CardLocation> {
        for column in &self.columns {
            if let Some(index) = column.position_of(card_id) {
                return Some(CardLocation {
                    column_id: Some(column.id.clone()),
                    index,
                });
            }
        }
        self.unassigned
            .iter()
            .position(|card| &card.id == card_id)
            .map(|index| CardLocation {
                column_id: None,
                index,
            })
    }

    pub fn with_column_added(&self, column: Column) -> KanbanResult<Self> {
        if self.column(&column.id).is_some() {
            return Err(KanbanError::Validation(format!(
                "column {} already exists",
                column.id
            )));
        }
        let mut board = self.clone();
        board.columns.push(column);
        Ok(board)
    }

    /// Removes a column. Its cards move to the unassigned bucket rather than
    /// disappearing.
    pub fn without_column(&self, column_id: &str) -> KanbanResult<Self> {
        let column = self
            .column(column_id)
            .ok_or_else(|| KanbanError::NotFound(format!("column {}", column_id)))?;
        let mut board = self.clone();
        board.unassigned.extend(column.cards.iter().cloned());
        board.columns.retain(|c| c.id != column_id);
        Ok(board)
    }

    pub fn with_card_added(&self, column_id: &str, card: Card) -> KanbanResult<Self> {
        self.with_card_inserted(
            &CardLocation {
                column_id: Some(column_id.to_string()),
                index: usize::MAX,
            },
            card,
        )
    }

    /// Inserts a card at a location; an index past the end appends.
    pub fn with_card_inserted(&self, location: &CardLocation, card: Card) -> KanbanResult<Self> {
        let mut board = self.clone();
        let cards = match &location.column_id {
            Some(column_id) => {
                &mut board
                    .columns
                    .iter_mut()
                    .find(|c| &c.id == column_id)
                    .ok_or_else(|| KanbanError::NotFound(format!("column {}", column_id)))?
                    .cards
            }
            None => &mut board.unassigned,
        };
        let index = location.index.min(cards.len());
        cards.insert(index, card);
        Ok(board)
    }

    /// Moves a card to the end of another column and points its status at
    /// that column. Moving within the same column returns an equal board.
    pub fn with_card_moved(&self, card_id: &CardId, from: &str, to: &str) -> KanbanResult<Self> {
        if from == to {
            return Ok(self.clone());
        }
        let source = self
            .column(from)
            .ok_or_else(|| KanbanError::NotFound(format!("column {}", from)))?;
        if self.column(to).is_none() {
            return Err(KanbanError::NotFound(format!("column {}", to)));
        }
        let card = source
            .card(card_id)
            .ok_or_else(|| KanbanError::NotFound(format!("card {} in column {}", card_id, from)))?
            .with_status(to.to_string());

        let mut board = self.clone();
        for column in board.columns.iter_mut() {
            if column.id == from {
                column.cards.retain(|c| &c.id != card_id);
            } else if column.id == to {
                column.cards.push(card.clone());
            }
        }
        Ok(board)
    }

    /// Substitutes the first card with the same id. Returns `None` when no
    /// card matches.
    pub fn with_card_replaced(&self, card: Card) -> Option<Self> {
        let id = card.id.clone();
        self.with_card_swapped(&id, card)
    }

    /// Replaces the card identified by `old_id` with `card`, which may carry
    /// a different id (temporary id reconciled to a remote one).
    pub fn with_card_swapped(&self, old_id: &CardId, card: Card) -> Option<Self> {
        let location = self.locate(old_id)?;
        let mut board = self.clone();
        let cards = match &location.column_id {
            Some(column_id) => &mut board.columns.iter_mut().find(|c| &c.id == column_id)?.cards,
            None => &mut board.unassigned,
        };
        cards[location.index] = card;
        Some(board)
    }

    pub fn with_card_updated<F>(&self, card_id: &CardId, update: F) -> Option<Self>
    where
        F: FnOnce(&Card) -> Card,
    {
        let updated = update(self.card(card_id)?);
        self.with_card_swapped(card_id, updated)
    }

    /// Removes a card, returning the new board, the removed card and where
    /// it was so the removal can be undone.
    pub fn without_card(&self, card_id: &CardId) -> Option<(Self, Card, CardLocation)> {
        let location = self.locate(card_id)?;
        let mut board = self.clone();
        let cards = match &location.column_id {
            Some(column_id) => &mut board.columns.iter_mut().find(|c| &c.id == column_id)?.cards,
            None => &mut board.unassigned,
        };
        let card = cards.remove(location.index);
        Some((board, card, location))
    }

    pub fn label(&self, label_id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == label_id)
    }

    /// Adds labels to the catalog, skipping ids that are already present.
    pub fn with_labels_merged<'a, I>(&self, labels: I) -> Self
    where
        I: IntoIterator<Item = &'a Label>,
    {
        let mut board = self.clone();
        for label in labels {
            if board.label(label.id).is_none() {
                board.labels.push(label.clone());
            }
        }
        board
    }

    /// Removes a label from the catalog and from every card that carries it.
    pub fn without_label(&self, label_id: LabelId) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|column| {
                    column.with_cards(
                        column
                            .cards
                            .iter()
                            .map(|card| card.without_label(label_id))
                            .collect(),
                    )
                })
                .collect(),
            unassigned: self
                .unassigned
                .iter()
                .map(|card| card.without_label(label_id))
                .collect(),
            labels: self
                .labels
                .iter()
                .filter(|l| l.id != label_id)
                .cloned()
                .collect(),
        }
    }
}
