//! Entities and wire DTOs.
//!
//! Field names serialize camelCase to match the browser-facing JSON contract
//! (`assigneeId`, `dueDate`, `createdAt`, ...). Timestamps are RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Entities ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub assignee_id: Option<u64>,
    pub creator_id: u64,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Requests ──────────────────────────────────────────────────

/// Body of POST /api/tasks. `title` and `creator_id` are options so their
/// absence reaches the handler as a 400 instead of a deserialize reject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<u64>,
    pub creator_id: Option<u64>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Body of PUT /api/tasks/:id. Partial patch: a field absent from the JSON
/// is left untouched. For the two nullable fields the outer Option tracks
/// presence and the inner one carries an explicit `null` (clear).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub assignee_id: Option<Option<u64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of POST /api/users and PUT /api/users/:id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
}

// ── UI-facing form shapes ─────────────────────────────────────

/// What the task dialog edits. The user selector binds `user_id`; the API
/// client maps it to the wire's `assigneeId`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub user_id: Option<u64>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskForm {
    /// Prefill from an existing task row (edit mode).
    pub fn from_task(task: &TaskResponse) -> Self {
        TaskForm {
            title: task.title.clone(),
            description: task.description.clone(),
            user_id: task.assignee_id,
            due_date: task.due_date,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        Ok(())
    }

    /// Full-form patch: every editable field is re-sent, including an
    /// explicit null for a cleared assignee or due date. `completed` is
    /// left out — only the toggle path touches it.
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            completed: None,
            assignee_id: Some(self.user_id),
            due_date: Some(self.due_date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        UserForm {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err("Name and email are required".to_string());
        }
        Ok(())
    }
}

// ── Responses ─────────────────────────────────────────────────

/// Task joined with its related user rows. Null-safe: a dangling
/// assignee/creator id yields `null` rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub assignee_id: Option<u64>,
    pub creator_id: u64,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignee: Option<User>,
    pub creator: Option<User>,
}

impl TaskResponse {
    pub fn new(task: Task, assignee: Option<User>, creator: Option<User>) -> Self {
        TaskResponse {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            assignee_id: task.assignee_id,
            creator_id: task.creator_id,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
            assignee,
            creator,
        }
    }
}

/// GET /api/users/:id — the user plus both task collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Tasks where this user is the assignee.
    pub tasks: Vec<Task>,
    /// Tasks where this user is the creator.
    pub created_tasks: Vec<Task>,
}

/// Response envelope used by the single-user endpoints
/// (create/get/update). List and task endpoints return bare JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope { success: true, data }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: 1,
            title: "Buy milk".into(),
            description: String::new(),
            completed: false,
            assignee_id: None,
            creator_id: 1,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("assigneeId").is_some());
        assert!(json.get("creatorId").is_some());
        assert!(json.get("dueDate").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("assignee_id").is_none());
    }

    #[test]
    fn patch_absent_field_is_none() {
        let patch: TaskPatch = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(patch.completed, Some(true));
        assert_eq!(patch.title, None);
        assert_eq!(patch.assignee_id, None);
        assert_eq!(patch.due_date, None);
    }

    #[test]
    fn patch_explicit_null_is_present() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"assigneeId":null,"dueDate":null}"#).unwrap();
        assert_eq!(patch.assignee_id, Some(None));
        assert_eq!(patch.due_date, Some(None));
    }

    #[test]
    fn patch_value_round_trips() {
        let patch: TaskPatch = serde_json::from_str(r#"{"assigneeId":7}"#).unwrap();
        assert_eq!(patch.assignee_id, Some(Some(7)));

        // Absent fields must not reappear on the wire
        let json = serde_json::to_string(&patch).unwrap();
        assert!(!json.contains("title"));
        assert!(!json.contains("dueDate"));
    }

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("x"));
        assert_eq!(req.creator_id, None);
        assert_eq!(req.due_date, None);
    }
}
