pub mod board;
pub mod card;
pub mod checklist;
pub mod column;
pub mod comment;
pub mod config;
pub mod label;
