//! Page controllers for the two screens.
//!
//! Each page holds a transient copy of the server's lists plus local UI
//! state (filter, open dialog, error banner). Every mutation re-fetches the
//! affected list rather than patching local state — the server is the only
//! truth. Errors land in `error` and the page always stays usable; there is
//! no terminal failure state.

use crate::client::{ApiClient, ClientError};
use crate::models::{TaskForm, TaskPatch, TaskResponse, User, UserDetailResponse, UserForm};

// ── Task filter ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    fn keeps(self, task: &TaskResponse) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

// ── Dialog state ───────────────────────────────────────────────

/// An open task dialog. `editing` is the task id in edit mode, None when
/// creating.
#[derive(Debug, Clone)]
pub struct TaskDialog {
    pub editing: Option<u64>,
    pub form: TaskForm,
}

#[derive(Debug, Clone)]
pub struct UserDialog {
    pub editing: Option<u64>,
    pub form: UserForm,
}

// ── Tasks page ─────────────────────────────────────────────────

pub struct TasksPage {
    client: ApiClient,
    /// The acting user: new tasks are created with this `creatorId`.
    creator_id: u64,
    pub tasks: Vec<TaskResponse>,
    pub users: Vec<User>,
    pub filter: Filter,
    pub loading: bool,
    pub error: Option<String>,
    pub dialog: Option<TaskDialog>,
}

impl TasksPage {
    pub fn new(client: ApiClient, creator_id: u64) -> Self {
        TasksPage {
            client,
            creator_id,
            tasks: Vec::new(),
            users: Vec::new(),
            filter: Filter::All,
            loading: true,
            error: None,
            dialog: None,
        }
    }

    /// Initial load: tasks and users fetched concurrently, page renders
    /// once both settle.
    pub async fn load(&mut self) {
        self.loading = true;
        let (tasks, users) = tokio::join!(self.client.list_tasks(), self.client.list_users());

        match tasks {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
            }
            Err(_) => {
                self.tasks = Vec::new();
                self.error = Some("Failed to fetch tasks. Please try again later.".to_string());
            }
        }
        match users {
            Ok(users) => self.users = users,
            Err(_) => {
                self.error =
                    Some("Failed to fetch users. Some features may be limited.".to_string());
            }
        }
        self.loading = false;
    }

    /// The list as rendered: the current filter applied client-side,
    /// server order preserved.
    pub fn visible_tasks(&self) -> Vec<&TaskResponse> {
        self.tasks.iter().filter(|t| self.filter.keeps(t)).collect()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn open_create_dialog(&mut self) {
        self.dialog = Some(TaskDialog {
            editing: None,
            form: TaskForm::default(),
        });
    }

    pub fn open_edit_dialog(&mut self, task_id: u64) {
        if let Some(task) = self.tasks.iter().find(|t| t.id == task_id) {
            self.dialog = Some(TaskDialog {
                editing: Some(task_id),
                form: TaskForm::from_task(task),
            });
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Submit the open dialog: create or full-form update, then re-fetch.
    /// Client-side validation failures keep the dialog open.
    pub async fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.clone() else {
            return;
        };
        if let Err(msg) = dialog.form.validate() {
            self.error = Some(msg);
            return;
        }

        let result = match dialog.editing {
            Some(id) => self.client.update_task(id, &dialog.form.to_patch()).await,
            None => self.client.create_task(&dialog.form, self.creator_id).await,
        };

        match result {
            Ok(_) => {
                self.dialog = None;
                self.error = None;
                self.refetch_tasks().await;
            }
            Err(err) => self.error = Some(action_failed(&err, "Failed to save task")),
        }
    }

    pub async fn delete_task(&mut self, task_id: u64) {
        match self.client.delete_task(task_id).await {
            Ok(()) => {
                self.error = None;
                self.refetch_tasks().await;
            }
            Err(_) => self.error = Some("Failed to delete task. Please try again.".to_string()),
        }
    }

    /// Flip `completed` on one task. Sends a patch carrying only the flag,
    /// so nothing else can be clobbered.
    pub async fn toggle_complete(&mut self, task_id: u64) {
        let Some(completed) = self.tasks.iter().find(|t| t.id == task_id).map(|t| t.completed)
        else {
            return;
        };

        let patch = TaskPatch {
            completed: Some(!completed),
            ..TaskPatch::default()
        };
        match self.client.update_task(task_id, &patch).await {
            Ok(_) => {
                self.error = None;
                self.refetch_tasks().await;
            }
            Err(err) => self.error = Some(action_failed(&err, "Failed to update")),
        }
    }

    async fn refetch_tasks(&mut self) {
        match self.client.list_tasks().await {
            Ok(tasks) => self.tasks = tasks,
            Err(_) => {
                self.tasks = Vec::new();
                self.error = Some("Failed to fetch tasks. Please try again later.".to_string());
            }
        }
    }
}

// ── Users page ─────────────────────────────────────────────────

pub struct UsersPage {
    client: ApiClient,
    pub users: Vec<User>,
    pub loading: bool,
    pub error: Option<String>,
    pub dialog: Option<UserDialog>,
    /// Open detail modal, fetched on demand when a user is selected.
    pub detail: Option<UserDetailResponse>,
}

impl UsersPage {
    pub fn new(client: ApiClient) -> Self {
        UsersPage {
            client,
            users: Vec::new(),
            loading: true,
            error: None,
            dialog: None,
            detail: None,
        }
    }

    pub async fn load(&mut self) {
        self.loading = true;
        self.refetch_users().await;
        self.loading = false;
    }

    /// Selecting a user fetches the detail view (user + both task lists)
    /// and opens the modal.
    pub async fn select_user(&mut self, user_id: u64) {
        match self.client.get_user(user_id).await {
            Ok(detail) => {
                self.detail = Some(detail);
                self.error = None;
            }
            Err(_) => {
                self.error =
                    Some("Failed to fetch user details. Please try again later.".to_string());
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn open_create_dialog(&mut self) {
        self.dialog = Some(UserDialog {
            editing: None,
            form: UserForm::default(),
        });
    }

    pub fn open_edit_dialog(&mut self, user_id: u64) {
        if let Some(user) = self.users.iter().find(|u| u.id == user_id) {
            self.dialog = Some(UserDialog {
                editing: Some(user_id),
                form: UserForm::from_user(user),
            });
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    pub async fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.clone() else {
            return;
        };
        if let Err(msg) = dialog.form.validate() {
            self.error = Some(msg);
            return;
        }

        let result = match dialog.editing {
            Some(id) => self.client.update_user(id, &dialog.form).await,
            None => self.client.create_user(&dialog.form).await,
        };

        match result {
            Ok(_) => {
                self.dialog = None;
                self.error = None;
                self.refetch_users().await;
            }
            Err(err) => self.error = Some(action_failed(&err, "Failed to save user")),
        }
    }

    pub async fn delete_user(&mut self, user_id: u64) {
        match self.client.delete_user(user_id).await {
            Ok(()) => {
                self.error = None;
                self.refetch_users().await;
            }
            Err(err) => self.error = Some(action_failed(&err, "Failed to delete user")),
        }
    }

    async fn refetch_users(&mut self) {
        match self.client.list_users().await {
            Ok(users) => {
                self.users = users;
                self.error = None;
            }
            Err(_) => {
                self.error = Some("Failed to fetch users. Please try again later.".to_string());
            }
        }
    }
}

/// Banner text for a failed mutation: the backend's message when it sent
/// one, otherwise a generic fallback.
fn action_failed(err: &ClientError, fallback: &str) -> String {
    match err {
        ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
        _ => fallback.to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────
