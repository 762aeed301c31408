pub mod config;
pub mod error;
pub mod notification;
pub mod result;

pub use config::{AppConfig, RemoteSettings, RollbackPolicy, SyncSettings};
pub use error::KanbanError;
pub use notification::{Notification, NotificationLevel};
pub use result::KanbanResult;
