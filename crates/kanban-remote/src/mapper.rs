//! Pure conversions between the task service's model and the board model.
//!
//! Every field read by [`to_card`] is written back by [`to_update_request`]
//! (status goes through [`status_update_request`]), so a card survives a
//! save and reload unchanged.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use kanban_domain::{
    Board, Card, Checklist, ChecklistItem, Column, Comment, EntityId, FieldUpdate, Label,
};

use crate::model::{
    RemoteChecklist, RemoteChecklistItem, RemoteComment, RemoteStatus, RemoteTag, RemoteTask,
    TaskUpdateRequest,
};

/// Columns for the list's statuses, in the service's status order.
pub fn to_columns(statuses: &[RemoteStatus]) -> Vec<Column> {
    let mut ordered: Vec<&RemoteStatus> = statuses.iter().collect();
    ordered.sort_by(|a, b| match (a.orderindex, b.orderindex) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    ordered
        .into_iter()
        .map(|status| Column {
            color: status.color.clone(),
            ..Column::new(status.key().to_string(), status.status.clone())
        })
        .collect()
}

pub fn to_card(task: &RemoteTask) -> Card {
    let mut labels: Vec<Label> = Vec::new();
    for label in task.tags.iter().map(to_label) {
        if !labels.iter().any(|l| l.id == label.id) {
            labels.push(label);
        }
    }

    let mut checklists: Vec<&RemoteChecklist> = task.checklists.iter().collect();
    checklists.sort_by(|a, b| {
        a.orderindex
            .unwrap_or(0.0)
            .total_cmp(&b.orderindex.unwrap_or(0.0))
    });

    Card {
        id: EntityId::remote(task.id.clone()),
        title: task.name.clone(),
        description: task.description.clone().filter(|d| !d.is_empty()),
        due_date: task.due_date.and_then(millis_to_date),
        status_id: task.status.as_ref().map(|s| s.key().to_string()),
        tag_ids: labels.iter().map(|l| l.id).collect(),
        labels,
        comments: Vec::new(),
        checklists: checklists.into_iter().map(to_checklist).collect(),
    }
}

/// The service exposes tag colors on some endpoints only; without one the
/// color comes from the palette so the same name always looks the same.
pub fn to_label(tag: &RemoteTag) -> Label {
    match tag.tag_bg.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(color) => Label::new(tag.name.clone(), color.to_string()),
        None => Label::with_default_color(tag.name.clone()),
    }
}

pub fn to_checklist(checklist: &RemoteChecklist) -> Checklist {
    Checklist::new(
        checklist.id.clone(),
        checklist.name.clone(),
        checklist
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| to_checklist_item(item, position))
            .collect(),
    )
}

pub fn to_checklist_item(item: &RemoteChecklistItem, position: usize) -> ChecklistItem {
    ChecklistItem {
        id: EntityId::remote(item.id.clone()),
        text: item.name.clone(),
        completed: item.resolved,
        order_index: item.orderindex.unwrap_or(position as f64),
    }
}

pub fn to_comment(comment: &RemoteComment) -> Comment {
    Comment::new(
        comment.id.clone(),
        comment.comment_text.clone(),
        comment
            .date
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default(),
        comment.user.as_ref().and_then(|u| u.username.clone()),
    )
}

/// Places each card in the column matching its status. Cards with no
/// matching column are kept in the unassigned bucket and logged.
pub fn distribute_cards(columns: Vec<Column>, cards: Vec<Card>) -> Board {
    let mut board = Board::new(columns);
    for card in cards {
        let slot = card
            .status_id
            .as_deref()
            .and_then(|status| board.columns.iter().position(|c| c.id == status));
        match slot {
            Some(index) => board.columns[index].cards.push(card),
            None => {
                tracing::warn!(
                    "Card {} ({}) has status {:?} with no matching column; keeping it unassigned",
                    card.id,
                    card.title,
                    card.status_id
                );
                board.unassigned.push(card);
            }
        }
    }
    let labels: Vec<Label> = board.cards().flat_map(|c| c.labels.iter().cloned()).collect();
    board.with_labels_merged(labels.iter())
}

/// Request that saves the card's editable fields.
pub fn to_update_request(card: &Card) -> TaskUpdateRequest {
    TaskUpdateRequest {
        name: Some(card.title.clone()),
        description: Some(card.description.clone().unwrap_or_default()),
        due_date: FieldUpdate::from(card.due_date.map(date_to_millis)),
        status: None,
    }
}

pub fn status_update_request(status_label: &str) -> TaskUpdateRequest {
    TaskUpdateRequest {
        status: Some(status_label.to_string()),
        ..TaskUpdateRequest::default()
    }
}

/// Calendar date (UTC) of an epoch-milliseconds timestamp.
pub fn millis_to_date(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Epoch milliseconds of midnight UTC on `date`.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
