use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const TEMPORARY_PREFIX: &str = "tmp-";

/// Identifier of a card or checklist item.
///
/// `Remote` ids come from the task service and are authoritative.
/// `Temporary` ids are minted locally for optimistic entities and are
/// replaced once the remote service has assigned a real id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityId {
    Remote(String),
    Temporary(Uuid),
}

pub type CardId = EntityId;
pub type ItemId = EntityId;

impl EntityId {
    pub fn remote(id: impl Into<String>) -> Self {
        Self::Remote(id.into())
    }

    pub fn temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The remote id, if the entity has one yet.
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            Self::Remote(id) => Some(id),
            Self::Temporary(_) => None,
        }
    }

    pub fn as_temporary(&self) -> Option<Uuid> {
        match self {
            Self::Temporary(id) => Some(*id),
            Self::Remote(_) => None,
        }
    }

    /// Parses user input: `tmp-<uuid>` is temporary, anything else remote.
    pub fn parse(input: &str) -> Self {
        input
            .strip_prefix(TEMPORARY_PREFIX)
            .and_then(|rest| Uuid::parse_str(rest).ok())
            .map(Self::Temporary)
            .unwrap_or_else(|| Self::Remote(input.to_string()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{}", id),
            Self::Temporary(id) => write!(f, "{}{}", TEMPORARY_PREFIX, id),
        }
    }
}
