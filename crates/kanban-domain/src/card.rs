use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::checklist::{Checklist, ChecklistId};
use crate::column::ColumnId;
use crate::comment::Comment;
use crate::id::{CardId, EntityId};
use crate::label::{Label, LabelId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status_id: Option<ColumnId>,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Newest first, matching the order the service returns them in.
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
    /// Labels that came from the task's tags on the last pull. Any other
    /// label on the card was assigned locally.
    #[serde(default)]
    pub tag_ids: Vec<LabelId>,
}

impl Card {
    pub fn new(id: CardId, title: String, status_id: Option<ColumnId>) -> Self {
        Self {
            id,
            title,
            description: None,
            due_date: None,
            status_id,
            labels: Vec::new(),
            comments: Vec::new(),
            checklists: Vec::new(),
            tag_ids: Vec::new(),
        }
    }

    /// Optimistic card that has not been created remotely yet.
    pub fn temporary(title: String, status_id: ColumnId) -> Self {
        Self::new(EntityId::temporary(), title, Some(status_id))
    }

    pub fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }

    pub fn with_status(&self, status_id: ColumnId) -> Self {
        Self {
            status_id: Some(status_id),
            ..self.clone()
        }
    }

    pub fn has_label(&self, label_id: LabelId) -> bool {
        self.labels.iter().any(|label| label.id == label_id)
    }

    /// Adds the label if absent, removes it if present.
    pub fn with_label_toggled(&self, label: &Label) -> Self {
        if self.has_label(label.id) {
            self.without_label(label.id)
        } else {
            let mut labels = self.labels.clone();
            labels.push(label.clone());
            Self {
                labels,
                ..self.clone()
            }
        }
    }

    pub fn without_label(&self, label_id: LabelId) -> Self {
        Self {
            labels: self
                .labels
                .iter()
                .filter(|label| label.id != label_id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    pub fn with_comments(&self, comments: Vec<Comment>) -> Self {
        Self {
            comments,
            ..self.clone()
        }
    }

    pub fn with_comment_prepended(&self, comment: Comment) -> Self {
        let mut comments = Vec::with_capacity(self.comments.len() + 1);
        comments.push(comment);
        comments.extend(self.comments.iter().cloned());
        self.with_comments(comments)
    }

    pub fn checklist(&self, checklist_id: &str) -> Option<&Checklist> {
        self.checklists.iter().find(|c| c.id == checklist_id)
    }

    pub fn with_checklists(&self, checklists: Vec<Checklist>) -> Self {
        Self {
            checklists,
            ..self.clone()
        }
    }

    pub fn with_checklist_added(&self, checklist: Checklist) -> Self {
        let mut checklists = self.checklists.clone();
        checklists.push(checklist);
        self.with_checklists(checklists)
    }

    /// Puts a checklist back at `index`; past the end appends.
    pub fn with_checklist_inserted(&self, index: usize, checklist: Checklist) -> Self {
        let mut checklists = self.checklists.clone();
        checklists.insert(index.min(checklists.len()), checklist);
        self.with_checklists(checklists)
    }

    pub fn without_checklist(&self, checklist_id: &str) -> Self {
        self.with_checklists(
            self.checklists
                .iter()
                .filter(|c| c.id != checklist_id)
                .cloned()
                .collect(),
        )
    }

    pub fn with_checklist_updated<F>(&self, checklist_id: &ChecklistId, update: F) -> Self
    where
        F: Fn(&Checklist) -> Checklist,
    {
        self.with_checklists(
            self.checklists
                .iter()
                .map(|c| if &c.id == checklist_id { update(c) } else { c.clone() })
                .collect(),
        )
    }

    /// Combines a freshly fetched card with state that only lives locally:
    /// label assignments the service does not know about and comments that
    /// were already loaded. Labels the local card got from tags are dropped,
    /// so a tag removed remotely leaves the card.
    pub fn merged_with_local(&self, local: &Card) -> Self {
        let mut labels = self.labels.clone();
        for label in local.labels.iter().filter(|l| !local.tag_ids.contains(&l.id)) {
            if !labels.iter().any(|l| l.id == label.id) {
                labels.push(label.clone());
            }
        }
        let comments = if self.comments.is_empty() {
            local.comments.clone()
        } else {
            self.comments.clone()
        };
        Self {
            labels,
            comments,
            ..self.clone()
        }
    }
}
