//! HTTP client for the task/user API.
//!
//! Owns the UI↔wire translation: `TaskForm.user_id` becomes `assigneeId`
//! on the way out, and the `{success, data}` envelope the single-user
//! endpoints wrap their payloads in is peeled off on the way in. Every
//! failure carries the backend's status code and message body so the page
//! layer can decide what to show.

use crate::models::{
    CreateTaskRequest, Envelope, TaskForm, TaskPatch, TaskResponse, User, UserDetailResponse,
    UserForm, UserPayload,
};
use serde::de::DeserializeOwned;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    // ── Tasks ──────────────────────────────────────────────────

    pub async fn list_tasks(&self) -> Result<Vec<TaskResponse>, ClientError> {
        let response = self.http.get(self.url("/tasks")).send().await?;
        parse(response).await
    }

    pub async fn get_task(&self, id: u64) -> Result<TaskResponse, ClientError> {
        let response = self.http.get(self.url(&format!("/tasks/{id}"))).send().await?;
        parse(response).await
    }

    pub async fn create_task(
        &self,
        form: &TaskForm,
        creator_id: u64,
    ) -> Result<TaskResponse, ClientError> {
        let body = CreateTaskRequest {
            title: Some(form.title.clone()),
            description: Some(form.description.clone()),
            assignee_id: form.user_id,
            creator_id: Some(creator_id),
            due_date: form.due_date,
        };
        let response = self
            .http
            .post(self.url("/tasks"))
            .json(&body)
            .send()
            .await?;
        parse(response).await
    }

    pub async fn update_task(
        &self,
        id: u64,
        patch: &TaskPatch,
    ) -> Result<TaskResponse, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/tasks/{id}")))
            .json(patch)
            .send()
            .await?;
        parse(response).await
    }

    pub async fn delete_task(&self, id: u64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    // ── Users ──────────────────────────────────────────────────

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let response = self.http.get(self.url("/users")).send().await?;
        parse(response).await
    }

    pub async fn get_user(&self, id: u64) -> Result<UserDetailResponse, ClientError> {
        let response = self.http.get(self.url(&format!("/users/{id}"))).send().await?;
        let envelope: Envelope<UserDetailResponse> = parse(response).await?;
        Ok(envelope.data)
    }

    pub async fn create_user(&self, form: &UserForm) -> Result<User, ClientError> {
        let response = self
            .http
            .post(self.url("/users"))
            .json(&payload(form))
            .send()
            .await?;
        let envelope: Envelope<User> = parse(response).await?;
        Ok(envelope.data)
    }

    pub async fn update_user(&self, id: u64, form: &UserForm) -> Result<User, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/users/{id}")))
            .json(&payload(form))
            .send()
            .await?;
        let envelope: Envelope<User> = parse(response).await?;
        Ok(envelope.data)
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/users/{id}")))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn payload(form: &UserForm) -> UserPayload {
    UserPayload {
        name: Some(form.name.clone()),
        email: Some(form.email.clone()),
    }
}

/// Reject non-2xx responses, extracting the backend's `{"error": ...}` body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or_default()
            .to_string(),
        Err(_) => String::new(),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    Ok(check(response).await?.json().await?)
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ClientError {
    /// The backend answered with a non-2xx status.
    Api { status: u16, message: String },
    /// The request never completed (connection, decode, ...).
    Transport(reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Api { status, message } if message.is_empty() => {
                write!(f, "HTTP {status}")
            }
            ClientError::Api { status, message } => write!(f, "HTTP {status}: {message}"),
            ClientError::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

// ── Tests ──────────────────────────────────────────────────────
// End-to-end: real router on an ephemeral port, driven through the client.
