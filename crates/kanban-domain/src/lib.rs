pub mod board;
pub mod card;
pub mod checklist;
pub mod column;
pub mod comment;
pub mod field_update;
pub mod id;
pub mod label;
pub mod snapshot;

pub use board::{Board, CardLocation};
pub use card::Card;
pub use checklist::{Checklist, ChecklistId, ChecklistItem};
pub use column::{Column, ColumnId};
pub use comment::Comment;
pub use field_update::FieldUpdate;
pub use id::{CardId, EntityId, ItemId};
pub use label::{Label, LabelId};
pub use snapshot::BoardSnapshot;
