use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// User-facing message describing the outcome of a sync action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub level: NotificationLevel,
    pub action: String,
    pub message: String,
}

impl Notification {
    pub fn info(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, action, message)
    }

    pub fn error(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, action, message)
    }

    fn new(level: NotificationLevel, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            action: action.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}
