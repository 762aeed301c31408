use async_trait::async_trait;
use kanban_core::KanbanResult;

use crate::model::{
    ChecklistItemUpdate, CreatedComment, RemoteChecklist, RemoteChecklistItem, RemoteComment,
    RemoteStatus, RemoteTask, TaskUpdateRequest,
};

/// Operations against the remote task service, one per resource verb.
///
/// Implementations are stateless request/response and never retry; a
/// failed call is reported to the caller as is.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Statuses of the configured list, which become the board's columns.
    async fn list_statuses(&self) -> KanbanResult<Vec<RemoteStatus>>;

    async fn list_tasks(&self, include_checklists: bool) -> KanbanResult<Vec<RemoteTask>>;

    async fn get_task(&self, task_id: &str) -> KanbanResult<RemoteTask>;

    /// Creates a task in the configured list. `status` is the status label.
    async fn create_task(&self, title: &str, status: &str) -> KanbanResult<RemoteTask>;

    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdateRequest,
    ) -> KanbanResult<RemoteTask>;

    async fn delete_task(&self, task_id: &str) -> KanbanResult<()>;

    async fn list_comments(&self, task_id: &str) -> KanbanResult<Vec<RemoteComment>>;

    async fn create_comment(&self, task_id: &str, text: &str) -> KanbanResult<CreatedComment>;

    async fn create_checklist(&self, task_id: &str, name: &str) -> KanbanResult<RemoteChecklist>;

    async fn delete_checklist(&self, checklist_id: &str) -> KanbanResult<()>;

    async fn create_checklist_item(
        &self,
        checklist_id: &str,
        name: &str,
        order_index: Option<f64>,
    ) -> KanbanResult<RemoteChecklistItem>;

    async fn update_checklist_item(
        &self,
        checklist_id: &str,
        item_id: &str,
        update: &ChecklistItemUpdate,
    ) -> KanbanResult<()>;

    async fn delete_checklist_item(&self, checklist_id: &str, item_id: &str) -> KanbanResult<()>;
}
