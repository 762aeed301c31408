//! Boundary to the remote task service.
//!
//! [`TaskService`] is the seam the sync layer talks to; [`ClickUpClient`]
//! implements it over HTTP. [`mapper`] converts between the wire model in
//! [`model`] and the board model in `kanban-domain`.

pub mod client;
pub mod mapper;
pub mod model;
pub mod service;

pub use client::ClickUpClient;
pub use model::{
    ChecklistItemUpdate, CreatedComment, RemoteChecklist, RemoteChecklistItem, RemoteComment,
    RemoteStatus, RemoteTag, RemoteTask, RemoteUser, TaskUpdateRequest,
};
pub use service::TaskService;
