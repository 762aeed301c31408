//! Point-in-time capture of the board.
//!
//! `BoardSnapshot` is what gets written to disk after every mutation and
//! read back once at startup.

use crate::Board;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub board: Board,
    /// When the board was last replaced from the remote service.
    #[serde(default)]
    pub pulled_at: Option<DateTime<Utc>>,
}

impl BoardSnapshot {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            pulled_at: None,
        }
    }
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self::new(Board::default_board())
    }
}
