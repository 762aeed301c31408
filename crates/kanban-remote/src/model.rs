//! Wire types for the task service's JSON API.
//!
//! The service is loose about number encoding: ids may arrive as numbers or
//! strings, timestamps are epoch milliseconds in strings, order indexes may
//! be either. The helpers in [`de`] accept both.

use kanban_domain::FieldUpdate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub orderindex: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl RemoteStatus {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status: status.into(),
            color: None,
            orderindex: None,
            kind: None,
        }
    }

    /// Stable key for the status: its id, or its label on accounts where the
    /// service does not expose status ids.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTag {
    pub name: String,
    #[serde(default)]
    pub tag_fg: Option<String>,
    #[serde(default)]
    pub tag_bg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteChecklistItem {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub orderindex: Option<f64>,
    #[serde(default)]
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteChecklist {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub orderindex: Option<f64>,
    #[serde(default)]
    pub items: Vec<RemoteChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTask {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<RemoteStatus>,
    #[serde(default, deserialize_with = "de::opt_millis")]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub tags: Vec<RemoteTag>,
    #[serde(default)]
    pub checklists: Vec<RemoteChecklist>,
}

impl RemoteTask {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: RemoteStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            status: Some(status),
            due_date: None,
            tags: Vec::new(),
            checklists: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteComment {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub comment_text: String,
    #[serde(default)]
    pub user: Option<RemoteUser>,
    #[serde(default, deserialize_with = "de::opt_millis")]
    pub date: Option<i64>,
}

/// Response to creating a comment: only the id and timestamp come back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedComment {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_millis")]
    pub date: Option<i64>,
}

/// Partial task update. Unset fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Epoch milliseconds; `Clear` sends `null` to remove the due date.
    #[serde(skip_serializing_if = "FieldUpdate::is_no_change")]
    pub due_date: FieldUpdate<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChecklistItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTaskRequest<'a> {
    pub name: &'a str,
    pub status: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCommentRequest<'a> {
    pub comment_text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateChecklistItemRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderindex: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub statuses: Vec<RemoteStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TasksResponse {
    #[serde(default)]
    pub tasks: Vec<RemoteTask>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<RemoteComment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChecklistResponse {
    pub checklist: RemoteChecklist,
}

/// Creating a checklist item answers with either the item or the whole
/// checklist depending on API version.
#[derive(Debug, Deserialize)]
pub(crate) struct ChecklistItemResponse {
    #[serde(default)]
    pub item: Option<RemoteChecklistItem>,
    #[serde(default)]
    pub checklist: Option<RemoteChecklist>,
}

impl ChecklistItemResponse {
    pub fn into_item(self, name: &str) -> Option<RemoteChecklistItem> {
        if let Some(item) = self.item {
            return Some(item);
        }
        // newest item with the submitted name
        self.checklist?
            .items
            .into_iter()
            .filter(|item| item.name == name)
            .max_by(|a, b| {
                a.orderindex
                    .unwrap_or(f64::MIN)
                    .total_cmp(&b.orderindex.unwrap_or(f64::MIN))
            })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub err: Option<String>,
}

pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }

    pub fn opt_string_or_number<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Epoch milliseconds; anything unparsable is treated as absent.
    pub fn opt_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}
