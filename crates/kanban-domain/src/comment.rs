use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment on a card. Comments are created remotely first, so `id` is
/// always the service's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<String>,
}

impl Comment {
    pub fn new(id: String, text: String, timestamp: DateTime<Utc>, author: Option<String>) -> Self {
        Self {
            id,
            text,
            timestamp,
            author,
        }
    }
}
