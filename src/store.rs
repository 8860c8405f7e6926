//! redb-backed datastore.
//!
//! Two row tables (users, tasks) with u64 primary keys and JSON-encoded
//! values, plus a meta table holding the auto-increment counters. The store
//! is the sole source of truth; every handler goes through it and nothing
//! durable lives anywhere else.

use crate::models::{Task, User};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

const USERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const TASKS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("tasks");
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_USER_ID: &str = "next_user_id";
const NEXT_TASK_ID: &str = "next_task_id";

/// Validated input for a task insert. Defaults (`completed=false`, null
/// assignee/due date) and timestamps are applied by the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assignee_id: Option<u64>,
    pub creator_id: u64,
    pub due_date: Option<DateTime<Utc>>,
}

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at the given path.
    /// Creates tables if they don't exist.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(USERS_TABLE)?;
            let _ = txn.open_table(TASKS_TABLE)?;
            let _ = txn.open_table(META_TABLE)?;
        }
        txn.commit()?;

        Ok(Store { db: Arc::new(db) })
    }

    // ── Users ──────────────────────────────────────────────────

    pub fn create_user(&self, name: String, email: String) -> Result<User, StoreError> {
        let txn = self.db.begin_write()?;
        let user = {
            let id = next_id(&txn, NEXT_USER_ID)?;
            let user = User { id, name, email };
            let mut users = txn.open_table(USERS_TABLE)?;
            users.insert(id, encode(&user)?.as_slice())?;
            user
        };
        txn.commit()?;
        Ok(user)
    }

    pub fn get_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let txn = self.db.begin_read()?;
        let users = txn.open_table(USERS_TABLE)?;
        match users.get(id)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    /// All users, ascending id (insertion order).
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let txn = self.db.begin_read()?;
        let users = txn.open_table(USERS_TABLE)?;

        let mut out = Vec::new();
        for entry in users.iter()? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    /// Overwrite name and email. Returns the updated row, or None if the
    /// user doesn't exist.
    pub fn update_user(
        &self,
        id: u64,
        name: String,
        email: String,
    ) -> Result<Option<User>, StoreError> {
        let Some(mut user) = self.get_user(id)? else {
            return Ok(None);
        };
        user.name = name;
        user.email = email;

        let txn = self.db.begin_write()?;
        {
            let mut users = txn.open_table(USERS_TABLE)?;
            users.insert(id, encode(&user)?.as_slice())?;
        }
        txn.commit()?;
        Ok(Some(user))
    }

    pub fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let deleted;
        {
            let mut users = txn.open_table(USERS_TABLE)?;
            deleted = users.remove(id)?.is_some();
        }
        txn.commit()?;
        Ok(deleted)
    }

    // ── Tasks ──────────────────────────────────────────────────

    pub fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let now = Utc::now();
        let txn = self.db.begin_write()?;
        let task = {
            let id = next_id(&txn, NEXT_TASK_ID)?;
            let task = Task {
                id,
                title: new.title,
                description: new.description,
                completed: false,
                assignee_id: new.assignee_id,
                creator_id: new.creator_id,
                due_date: new.due_date,
                created_at: now,
                updated_at: now,
            };
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            tasks.insert(id, encode(&task)?.as_slice())?;
            task
        };
        txn.commit()?;
        Ok(task)
    }

    pub fn get_task(&self, id: u64) -> Result<Option<Task>, StoreError> {
        let txn = self.db.begin_read()?;
        let tasks = txn.open_table(TASKS_TABLE)?;
        match tasks.get(id)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    /// All tasks, ascending id (insertion order).
    pub fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let txn = self.db.begin_read()?;
        let tasks = txn.open_table(TASKS_TABLE)?;

        let mut out = Vec::new();
        for entry in tasks.iter()? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    /// Write back a full task row (the caller owns patch application).
    pub fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            tasks.insert(task.id, encode(task)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn delete_task(&self, id: u64) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let deleted;
        {
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            deleted = tasks.remove(id)?.is_some();
        }
        txn.commit()?;
        Ok(deleted)
    }

    // ── Relations ──────────────────────────────────────────────
    // Linear scans. Fine for a single-user task list; there is no
    // secondary index to keep consistent.

    pub fn tasks_assigned_to(&self, user_id: u64) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(|t| t.assignee_id == Some(user_id))
            .collect())
    }

    pub fn tasks_created_by(&self, user_id: u64) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(|t| t.creator_id == user_id)
            .collect())
    }

    /// Null out `assignee_id` on every task assigned to the given user.
    /// Returns how many rows changed.
    pub fn clear_assignee(&self, user_id: u64) -> Result<usize, StoreError> {
        let mut affected = self.tasks_assigned_to(user_id)?;
        if affected.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let txn = self.db.begin_write()?;
        {
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            for task in &mut affected {
                task.assignee_id = None;
                task.updated_at = now;
                tasks.insert(task.id, encode(task)?.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(affected.len())
    }
}

/// Bump-and-return an auto-increment counter. Ids start at 1 and are never
/// reused, even after deletes.
fn next_id(txn: &WriteTransaction, key: &str) -> Result<u64, StoreError> {
    let mut meta = txn.open_table(META_TABLE)?;
    let next = meta.get(key)?.map(|g| g.value()).unwrap_or(1);
    meta.insert(key, next + 1)?;
    Ok(next)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StoreError {
    Redb(String),
    Decode(String),
    Encode(String),
}

// redb 2.x has many error types. Blanket them all into StoreError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for StoreError {
            fn from(e: $t) -> Self { StoreError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Redb(e) => write!(f, "redb: {e}"),
            StoreError::Decode(e) => write!(f, "decode: {e}"),
            StoreError::Encode(e) => write!(f, "encode: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temp store that auto-cleans.
    fn temp_store(name: &str) -> (Store, String) {
        let path = format!("/tmp/taskboard_test_{name}_{}.redb", std::process::id());
        let _ = fs::remove_file(&path); // clean up any leftover
        let store = Store::open(&path).unwrap();
        (store, path)
    }

    fn cleanup(path: &str) {
        let _ = fs::remove_file(path);
    }

    fn new_task(title: &str, creator_id: u64) -> NewTask {
        NewTask {
            title: title.into(),
            description: String::new(),
            assignee_id: None,
            creator_id,
            due_date: None,
        }
    }

    #[test]
    fn ids_start_at_one_and_increment() {
        let (store, path) = temp_store("ids");

        let a = store.create_user("Ada".into(), "ada@example.com".into()).unwrap();
        let b = store.create_user("Bob".into(), "bob@example.com".into()).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        // Deleting doesn't recycle ids
        assert!(store.delete_user(b.id).unwrap());
        let c = store.create_user("Cyd".into(), "cyd@example.com".into()).unwrap();
        assert_eq!(c.id, 3);

        cleanup(&path);
    }

    #[test]
    fn task_defaults_on_create() {
        let (store, path) = temp_store("defaults");

        let task = store.create_task(new_task("Buy milk", 1)).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.assignee_id, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.created_at, task.updated_at);

        cleanup(&path);
    }

    #[test]
    fn user_round_trip_and_update() {
        let (store, path) = temp_store("users");

        let user = store.create_user("Ada".into(), "ada@example.com".into()).unwrap();
        assert_eq!(store.get_user(user.id).unwrap().unwrap(), user);

        let updated = store
            .update_user(user.id, "Ada L".into(), "ada@lovelace.dev".into())
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "Ada L");
        assert_eq!(store.get_user(user.id).unwrap().unwrap(), updated);

        // Updating a missing user is a no-op
        assert!(store.update_user(99, "x".into(), "y".into()).unwrap().is_none());

        cleanup(&path);
    }

    #[test]
    fn delete_task_then_get_is_none() {
        let (store, path) = temp_store("del");

        let task = store.create_task(new_task("Doomed", 1)).unwrap();
        assert!(store.delete_task(task.id).unwrap());
        assert!(store.get_task(task.id).unwrap().is_none());
        assert!(!store.delete_task(task.id).unwrap());

        cleanup(&path);
    }

    #[test]
    fn list_is_ascending_by_id() {
        let (store, path) = temp_store("order");

        for title in ["one", "two", "three"] {
            store.create_task(new_task(title, 1)).unwrap();
        }
        let ids: Vec<u64> = store.list_tasks().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        cleanup(&path);
    }

    #[test]
    fn relation_scans() {
        let (store, path) = temp_store("relations");

        let mut assigned = new_task("assigned", 1);
        assigned.assignee_id = Some(2);
        store.create_task(assigned).unwrap();
        store.create_task(new_task("unassigned", 2)).unwrap();

        let for_two = store.tasks_assigned_to(2).unwrap();
        assert_eq!(for_two.len(), 1);
        assert_eq!(for_two[0].title, "assigned");

        let by_two = store.tasks_created_by(2).unwrap();
        assert_eq!(by_two.len(), 1);
        assert_eq!(by_two[0].title, "unassigned");

        cleanup(&path);
    }

    #[test]
    fn clear_assignee_nulls_references() {
        let (store, path) = temp_store("clear");

        let mut t = new_task("a", 1);
        t.assignee_id = Some(5);
        store.create_task(t.clone()).unwrap();
        store.create_task(t).unwrap();
        store.create_task(new_task("other", 1)).unwrap();

        assert_eq!(store.clear_assignee(5).unwrap(), 2);
        assert!(store.tasks_assigned_to(5).unwrap().is_empty());
        assert_eq!(store.list_tasks().unwrap().len(), 3);

        // Nothing left to clear
        assert_eq!(store.clear_assignee(5).unwrap(), 0);

        cleanup(&path);
    }

    #[test]
    fn rows_survive_reopen() {
        let (store, path) = temp_store("reopen");

        store.create_user("Ada".into(), "ada@example.com".into()).unwrap();
        store.create_task(new_task("persisted", 1)).unwrap();
        drop(store);

        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_users().unwrap().len(), 1);
        assert_eq!(store.list_tasks().unwrap().len(), 1);

        // Counters survive too
        let task = store.create_task(new_task("next", 1)).unwrap();
        assert_eq!(task.id, 2);

        cleanup(&path);
    }
}
