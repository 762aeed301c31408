#![allow(dead_code)]

use async_trait::async_trait;
use kanban_core::{KanbanError, KanbanResult, SyncSettings};
use kanban_domain::BoardSnapshot;
use kanban_remote::{
    ChecklistItemUpdate, CreatedComment, RemoteChecklist, RemoteChecklistItem, RemoteComment,
    RemoteStatus, RemoteTask, TaskService, TaskUpdateRequest,
};
use kanban_sync::{BoardStore, Notifier, SharedStore, SyncController};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListStatuses,
    ListTasks,
    GetTask(String),
    CreateTask { title: String, status: String },
    UpdateTask { id: String, update: TaskUpdateRequest },
    DeleteTask(String),
    ListComments(String),
    CreateComment { task: String, text: String },
    CreateChecklist { task: String, name: String },
    DeleteChecklist(String),
    CreateChecklistItem {
        checklist: String,
        name: String,
        order_index: Option<f64>,
    },
    UpdateChecklistItem {
        checklist: String,
        item: String,
        update: ChecklistItemUpdate,
    },
    DeleteChecklistItem { checklist: String, item: String },
}

/// Scripted response for one `update_task` call.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub delay: Duration,
    pub fail: bool,
}

#[derive(Default)]
pub struct FakeState {
    pub statuses: Vec<RemoteStatus>,
    pub tasks: Vec<RemoteTask>,
    pub comments: Vec<(String, RemoteComment)>,
    pub calls: Vec<Call>,
    /// Method names that fail with an HTTP 400.
    pub failing: HashSet<&'static str>,
    /// Checklist item names whose creation fails.
    pub failing_items: HashSet<String>,
    pub update_steps: VecDeque<Step>,
    pub create_item_delay: Option<Duration>,
    next_id: u64,
}

/// In-memory task service that records every call.
#[derive(Default)]
pub struct FakeService {
    pub state: Mutex<FakeState>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(statuses: Vec<RemoteStatus>, tasks: Vec<RemoteTask>) -> Self {
        let service = Self::new();
        {
            let mut state = service.state.lock();
            state.statuses = statuses;
            state.tasks = tasks;
        }
        service
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn fail(&self, method: &'static str) {
        self.state.lock().failing.insert(method);
    }

    pub fn recover(&self, method: &'static str) {
        self.state.lock().failing.remove(method);
    }

    pub fn fail_item(&self, name: &str) {
        self.state.lock().failing_items.insert(name.to_string());
    }

    pub fn script_updates(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.lock().update_steps.extend(steps);
    }

    pub fn delay_item_creation(&self, delay: Duration) {
        self.state.lock().create_item_delay = Some(delay);
    }

    pub fn item_creations(&self) -> Vec<(String, Option<f64>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateChecklistItem {
                    name, order_index, ..
                } => Some((name, order_index)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call, method: &'static str) -> KanbanResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failing.contains(method) {
            return Err(KanbanError::Http {
                status: 400,
                message: format!("{} rejected", method),
            });
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock();
        state.next_id += 1;
        format!("{}{}", prefix, state.next_id)
    }

    fn task(&self, id: &str) -> KanbanResult<RemoteTask> {
        self.state
            .lock()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| KanbanError::Http {
                status: 404,
                message: "Task not found".to_string(),
            })
    }
}

#[async_trait]
impl TaskService for FakeService {
    async fn list_statuses(&self) -> KanbanResult<Vec<RemoteStatus>> {
        self.record(Call::ListStatuses, "list_statuses")?;
        Ok(self.state.lock().statuses.clone())
    }

    async fn list_tasks(&self, _include_checklists: bool) -> KanbanResult<Vec<RemoteTask>> {
        self.record(Call::ListTasks, "list_tasks")?;
        Ok(self.state.lock().tasks.clone())
    }

    async fn get_task(&self, task_id: &str) -> KanbanResult<RemoteTask> {
        self.record(Call::GetTask(task_id.to_string()), "get_task")?;
        self.task(task_id)
    }

    async fn create_task(&self, title: &str, status: &str) -> KanbanResult<RemoteTask> {
        self.record(
            Call::CreateTask {
                title: title.to_string(),
                status: status.to_string(),
            },
            "create_task",
        )?;
        let task = RemoteTask::new(
            self.next_id("task-"),
            title,
            RemoteStatus {
                id: None,
                ..RemoteStatus::new("", status)
            },
        );
        self.state.lock().tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdateRequest,
    ) -> KanbanResult<RemoteTask> {
        let step = self.state.lock().update_steps.pop_front();
        self.record(
            Call::UpdateTask {
                id: task_id.to_string(),
                update: update.clone(),
            },
            "update_task",
        )?;
        if let Some(step) = step {
            tokio::time::sleep(step.delay).await;
            if step.fail {
                return Err(KanbanError::Network("connection reset".to_string()));
            }
        }
        self.task(task_id)
    }

    async fn delete_task(&self, task_id: &str) -> KanbanResult<()> {
        self.record(Call::DeleteTask(task_id.to_string()), "delete_task")?;
        self.state.lock().tasks.retain(|t| t.id != task_id);
        Ok(())
    }

    async fn list_comments(&self, task_id: &str) -> KanbanResult<Vec<RemoteComment>> {
        self.record(Call::ListComments(task_id.to_string()), "list_comments")?;
        Ok(self
            .state
            .lock()
            .comments
            .iter()
            .filter(|(task, _)| task == task_id)
            .map(|(_, comment)| comment.clone())
            .collect())
    }

    async fn create_comment(&self, task_id: &str, text: &str) -> KanbanResult<CreatedComment> {
        self.record(
            Call::CreateComment {
                task: task_id.to_string(),
                text: text.to_string(),
            },
            "create_comment",
        )?;
        Ok(CreatedComment {
            id: self.next_id("comment-"),
            date: Some(1_700_000_000_000),
        })
    }

    async fn create_checklist(&self, task_id: &str, name: &str) -> KanbanResult<RemoteChecklist> {
        self.record(
            Call::CreateChecklist {
                task: task_id.to_string(),
                name: name.to_string(),
            },
            "create_checklist",
        )?;
        let checklist = RemoteChecklist {
            id: self.next_id("cl-"),
            name: name.to_string(),
            orderindex: None,
            items: Vec::new(),
        };
        let mut state = self.state.lock();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) {
            task.checklists.push(checklist.clone());
        }
        Ok(checklist)
    }

    async fn delete_checklist(&self, checklist_id: &str) -> KanbanResult<()> {
        self.record(Call::DeleteChecklist(checklist_id.to_string()), "delete_checklist")?;
        for task in self.state.lock().tasks.iter_mut() {
            task.checklists.retain(|c| c.id != checklist_id);
        }
        Ok(())
    }

    async fn create_checklist_item(
        &self,
        checklist_id: &str,
        name: &str,
        order_index: Option<f64>,
    ) -> KanbanResult<RemoteChecklistItem> {
        let delay = self.state.lock().create_item_delay;
        self.record(
            Call::CreateChecklistItem {
                checklist: checklist_id.to_string(),
                name: name.to_string(),
                order_index,
            },
            "create_checklist_item",
        )?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.lock().failing_items.contains(name) {
            return Err(KanbanError::Http {
                status: 400,
                message: format!("cannot create '{}'", name),
            });
        }

        let item = RemoteChecklistItem {
            id: self.next_id("item-"),
            name: name.to_string(),
            orderindex: order_index,
            resolved: false,
        };
        let mut state = self.state.lock();
        for task in state.tasks.iter_mut() {
            for checklist in task.checklists.iter_mut().filter(|c| c.id == checklist_id) {
                checklist.items.push(item.clone());
            }
        }
        Ok(item)
    }

    async fn update_checklist_item(
        &self,
        checklist_id: &str,
        item_id: &str,
        update: &ChecklistItemUpdate,
    ) -> KanbanResult<()> {
        self.record(
            Call::UpdateChecklistItem {
                checklist: checklist_id.to_string(),
                item: item_id.to_string(),
                update: update.clone(),
            },
            "update_checklist_item",
        )
    }

    async fn delete_checklist_item(&self, checklist_id: &str, item_id: &str) -> KanbanResult<()> {
        self.record(
            Call::DeleteChecklistItem {
                checklist: checklist_id.to_string(),
                item: item_id.to_string(),
            },
            "delete_checklist_item",
        )?;
        for task in self.state.lock().tasks.iter_mut() {
            for checklist in task.checklists.iter_mut().filter(|c| c.id == checklist_id) {
                checklist.items.retain(|i| i.id != item_id);
            }
        }
        Ok(())
    }
}

pub fn status(id: &str, label: &str, order: f64) -> RemoteStatus {
    RemoteStatus {
        orderindex: Some(order),
        ..RemoteStatus::new(id, label)
    }
}

pub fn task(id: &str, name: &str, status: &RemoteStatus) -> RemoteTask {
    RemoteTask::new(id, name, status.clone())
}

/// A task in "to do" with one empty checklist `cl-steps`.
pub fn task_with_checklist(id: &str, name: &str, status: &RemoteStatus) -> RemoteTask {
    let mut task = task(id, name, status);
    task.checklists.push(RemoteChecklist {
        id: "cl-steps".to_string(),
        name: "Steps".to_string(),
        orderindex: Some(0.0),
        items: Vec::new(),
    });
    task
}

pub fn two_status_service() -> FakeService {
    let todo = status("s-todo", "To Do", 0.0);
    let done = status("s-done", "Done", 1.0);
    let task = task_with_checklist("t1", "Write report", &todo);
    FakeService::with_list(vec![todo, done], vec![task])
}

pub struct Harness {
    pub service: Arc<FakeService>,
    pub store: SharedStore,
    pub controller: SyncController,
}

pub fn harness(service: FakeService) -> Harness {
    harness_with(service, SyncSettings::default())
}

pub fn harness_with(service: FakeService, settings: SyncSettings) -> Harness {
    let service = Arc::new(service);
    let store = BoardStore::new(BoardSnapshot::default()).shared();
    let controller = SyncController::new(
        store.clone(),
        service.clone(),
        &settings,
        Notifier::new(),
    );
    Harness {
        service,
        store,
        controller,
    }
}

/// Harness with the two-status list already loaded.
pub async fn loaded() -> Harness {
    let h = harness(two_status_service());
    h.controller.load_board().await.unwrap();
    h.service.clear_calls();
    h
}

/// Lets spawned tasks run to completion.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
