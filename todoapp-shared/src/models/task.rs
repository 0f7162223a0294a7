//! Tasks inside a todo list
//!
//! Tasks carry both `list_id` and `owner_id`; every query filters on both,
//! so a task is only reachable through a list its caller owns.
//!
//! Updates replace the whole editable part of a task (see [`TaskPatch`]):
//! unchecking `completed` or clearing a deadline is an ordinary update.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id BLOB PRIMARY KEY NOT NULL,
//!     list_id BLOB NOT NULL,
//!     owner_id BLOB NOT NULL,
//!     title TEXT NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     completed INTEGER NOT NULL DEFAULT 0,
//!     status INTEGER NOT NULL DEFAULT 0,
//!     priority INTEGER NOT NULL DEFAULT 1,
//!     start_date TEXT,
//!     deadline TEXT,
//!     position INTEGER NOT NULL DEFAULT 0,
//!     created_at TEXT NOT NULL,
//!     deleted_at TEXT
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{validate_title, PageQuery};
use crate::error::{Error, Result};
use crate::store::filter::{FilterMap, Value};
use crate::store::record::{Fields, Projection, Record};
use crate::store::RecordStore;

/// Priority given to new tasks
pub const DEFAULT_PRIORITY: i64 = 1;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub list_id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub status: i64,
    pub priority: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl Projection for Task {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "list_id",
        "owner_id",
        "title",
        "description",
        "completed",
        "status",
        "priority",
        "start_date",
        "deadline",
        "position",
        "created_at",
    ];
}

impl Fields for Task {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("list_id", self.list_id.into()),
            ("owner_id", self.owner_id.into()),
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("completed", self.completed.into()),
            ("status", self.status.into()),
            ("priority", self.priority.into()),
            ("start_date", self.start_date.into()),
            ("deadline", self.deadline.into()),
            ("position", self.position.into()),
            ("created_at", self.created_at.into()),
        ]
    }
}

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const SCHEMA: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id BLOB PRIMARY KEY NOT NULL,
            list_id BLOB NOT NULL,
            owner_id BLOB NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            completed INTEGER NOT NULL DEFAULT 0,
            status INTEGER NOT NULL DEFAULT 0,
            priority INTEGER NOT NULL DEFAULT 1,
            start_date TEXT,
            deadline TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
        "CREATE INDEX IF NOT EXISTS tasks_list ON tasks (owner_id, list_id, created_at)",
    ];
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Full replacement of a task's editable fields
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPatch {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub status: i64,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: i64,
}

impl Fields for TaskPatch {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("completed", self.completed.into()),
            ("status", self.status.into()),
            ("priority", self.priority.into()),
            ("start_date", self.start_date.into()),
            ("deadline", self.deadline.into()),
            ("position", self.position.into()),
        ]
    }
}

impl TaskPatch {
    fn validate(&self) -> Result<()> {
        validate_title(&self.title, "task")?;
        if let (Some(start), Some(deadline)) = (self.start_date, self.deadline) {
            if deadline < start {
                return Err(Error::validation("deadline is before start date"));
            }
        }
        Ok(())
    }
}

fn in_list(owner_id: Uuid, list_id: Uuid) -> FilterMap {
    FilterMap::new()
        .eq("owner_id", owner_id)
        .eq("list_id", list_id)
}

impl Task {
    /// Builds an unsaved task with default fields
    pub fn new(owner_id: Uuid, list_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            list_id,
            owner_id,
            title: title.into(),
            description: String::new(),
            completed: false,
            status: 0,
            priority: DEFAULT_PRIORITY,
            start_date: None,
            deadline: None,
            position: 0,
            created_at: Utc::now(),
        }
    }

    /// Adds a task to a list
    ///
    /// The caller is responsible for checking the list exists and belongs to
    /// `owner_id`.
    pub async fn create(
        store: &RecordStore,
        owner_id: Uuid,
        list_id: Uuid,
        title: &str,
    ) -> Result<Self> {
        validate_title(title, "task")?;

        let task = Self::new(owner_id, list_id, title);
        store.create(&task).await?;
        info!(task_id = %task.id, list_id = %list_id, "Task created");
        Ok(task)
    }

    pub async fn find(store: &RecordStore, owner_id: Uuid, list_id: Uuid, id: Uuid) -> Result<Self> {
        store.read_one(&in_list(owner_id, list_id).eq("id", id)).await
    }

    /// One page of a list's tasks
    pub async fn list(
        store: &RecordStore,
        owner_id: Uuid,
        list_id: Uuid,
        query: &PageQuery,
    ) -> Result<Vec<Self>> {
        let mut filter = in_list(owner_id, list_id);
        query.apply(&mut filter);
        store.read_paginated(&filter).await
    }

    pub async fn update(
        store: &RecordStore,
        owner_id: Uuid,
        list_id: Uuid,
        id: Uuid,
        patch: &TaskPatch,
    ) -> Result<()> {
        patch.validate()?;

        let filter = in_list(owner_id, list_id).eq("id", id);
        store.update_submodel::<Task, _>(&filter, patch).await?;
        Ok(())
    }

    pub async fn delete(store: &RecordStore, owner_id: Uuid, list_id: Uuid, id: Uuid) -> Result<()> {
        let filter = in_list(owner_id, list_id).eq("id", id);
        store.delete::<Task>(&filter).await?;
        Ok(())
    }

    /// Soft-deletes every task of a list; `NotFound` when it had none
    pub async fn delete_for_list(store: &RecordStore, owner_id: Uuid, list_id: Uuid) -> Result<u64> {
        let deleted = store.delete::<Task>(&in_list(owner_id, list_id)).await?;
        debug!(list_id = %list_id, deleted, "Deleted tasks of list");
        Ok(deleted)
    }
}
