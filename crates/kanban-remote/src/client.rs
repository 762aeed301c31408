use async_trait::async_trait;
use kanban_core::{KanbanError, KanbanResult, RemoteSettings};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{
    ChecklistItemResponse, ChecklistItemUpdate, ChecklistResponse, CommentsResponse,
    CreateChecklistItemRequest, CreateCommentRequest, CreateTaskRequest, CreatedComment,
    ErrorBody, ListResponse, NameRequest, RemoteChecklist, RemoteChecklistItem, RemoteComment,
    RemoteStatus, RemoteTask, TaskUpdateRequest, TasksResponse,
};
use crate::service::TaskService;

/// HTTP client for the ClickUp v2 API.
///
/// Settings are fixed at construction. Missing credentials are reported as
/// `NotConfigured` before any request leaves the process.
#[derive(Debug, Clone)]
pub struct ClickUpClient {
    http: reqwest::Client,
    settings: RemoteSettings,
}

impl ClickUpClient {
    pub fn new(settings: RemoteSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.effective_base_url(), path)
    }

    fn list_path(&self, suffix: &str) -> KanbanResult<String> {
        let list_id = self.settings.require_list_id()?;
        Ok(format!("/list/{}{}", list_id, suffix))
    }

    fn request(&self, method: Method, path: &str) -> KanbanResult<RequestBuilder> {
        let token = self.settings.require_token()?;
        Ok(self
            .http
            .request(method, self.url(path))
            .header(AUTHORIZATION, token)
            .header(CONTENT_TYPE, "application/json"))
    }

    fn request_with_body<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> KanbanResult<RequestBuilder> {
        Ok(self.request(method, path)?.json(body))
    }

    async fn execute(&self, request: RequestBuilder) -> KanbanResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| KanbanError::Network(e.to_string()))?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| KanbanError::Network(e.to_string()))?;

        if status.is_success() {
            tracing::debug!("{} {} ({} bytes)", status.as_u16(), url, body.len());
            Ok(body)
        } else {
            let error = error_from_response(status, &body);
            tracing::warn!("Request to {} failed: {}", url, error);
            Err(error)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> KanbanResult<T> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| KanbanError::Serialization(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> KanbanResult<()> {
        self.execute(request).await.map(|_| ())
    }
}

/// Maps a non-2xx response to the error taxonomy, surfacing the service's
/// `err` message verbatim when the body carries one.
pub fn error_from_response(status: StatusCode, body: &str) -> KanbanError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.err)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && !trimmed.starts_with('{')).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => KanbanError::Auth(message),
        _ => KanbanError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl TaskService for ClickUpClient {
    async fn list_statuses(&self) -> KanbanResult<Vec<RemoteStatus>> {
        let path = self.list_path("")?;
        let list: ListResponse = self.send_json(self.request(Method::GET, &path)?).await?;
        Ok(list.statuses)
    }

    async fn list_tasks(&self, include_checklists: bool) -> KanbanResult<Vec<RemoteTask>> {
        let path = self.list_path(&format!(
            "/task?subtasks=true&include_checklists={}",
            include_checklists
        ))?;
        let response: TasksResponse = self.send_json(self.request(Method::GET, &path)?).await?;
        tracing::debug!("Fetched {} tasks", response.tasks.len());
        Ok(response.tasks)
    }

    async fn get_task(&self, task_id: &str) -> KanbanResult<RemoteTask> {
        let path = format!("/task/{}?include_checklists=true", task_id);
        self.send_json(self.request(Method::GET, &path)?).await
    }

    async fn create_task(&self, title: &str, status: &str) -> KanbanResult<RemoteTask> {
        let path = self.list_path("/task")?;
        let body = CreateTaskRequest {
            name: title,
            status,
        };
        self.send_json(self.request_with_body(Method::POST, &path, &body)?)
            .await
    }

    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdateRequest,
    ) -> KanbanResult<RemoteTask> {
        let path = format!("/task/{}", task_id);
        self.send_json(self.request_with_body(Method::PUT, &path, update)?)
            .await
    }

    async fn delete_task(&self, task_id: &str) -> KanbanResult<()> {
        let path = format!("/task/{}", task_id);
        self.send_empty(self.request(Method::DELETE, &path)?).await
    }

    async fn list_comments(&self, task_id: &str) -> KanbanResult<Vec<RemoteComment>> {
        let path = format!("/task/{}/comment", task_id);
        let response: CommentsResponse = self.send_json(self.request(Method::GET, &path)?).await?;
        Ok(response.comments)
    }

    async fn create_comment(&self, task_id: &str, text: &str) -> KanbanResult<CreatedComment> {
        let path = format!("/task/{}/comment", task_id);
        let body = CreateCommentRequest { comment_text: text };
        self.send_json(self.request_with_body(Method::POST, &path, &body)?)
            .await
    }

    async fn create_checklist(&self, task_id: &str, name: &str) -> KanbanResult<RemoteChecklist> {
        let path = format!("/task/{}/checklist", task_id);
        let response: ChecklistResponse = self
            .send_json(self.request_with_body(Method::POST, &path, &NameRequest { name })?)
            .await?;
        Ok(response.checklist)
    }

    async fn delete_checklist(&self, checklist_id: &str) -> KanbanResult<()> {
        let path = format!("/checklist/{}", checklist_id);
        self.send_empty(self.request(Method::DELETE, &path)?).await
    }

    async fn create_checklist_item(
        &self,
        checklist_id: &str,
        name: &str,
        order_index: Option<f64>,
    ) -> KanbanResult<RemoteChecklistItem> {
        let path = format!("/checklist/{}/checklist_item", checklist_id);
        let body = CreateChecklistItemRequest {
            name,
            orderindex: order_index,
        };
        let response: ChecklistItemResponse = self
            .send_json(self.request_with_body(Method::POST, &path, &body)?)
            .await?;
        response.into_item(name).ok_or_else(|| {
            KanbanError::Serialization(format!(
                "created checklist item '{}' missing from response",
                name
            ))
        })
    }

    async fn update_checklist_item(
        &self,
        checklist_id: &str,
        item_id: &str,
        update: &ChecklistItemUpdate,
    ) -> KanbanResult<()> {
        let path = format!("/checklist/{}/checklist_item/{}", checklist_id, item_id);
        self.send_empty(self.request_with_body(Method::PUT, &path, update)?)
            .await
    }

    async fn delete_checklist_item(&self, checklist_id: &str, item_id: &str) -> KanbanResult<()> {
        let path = format!("/checklist/{}/checklist_item/{}", checklist_id, item_id);
        self.send_empty(self.request(Method::DELETE, &path)?).await
    }
}
