//! Todo lists
//!
//! Every operation is scoped by `owner_id`, so one account can never see or
//! touch another account's lists through these methods.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE todo_lists (
//!     id BLOB PRIMARY KEY NOT NULL,
//!     owner_id BLOB NOT NULL,
//!     title TEXT NOT NULL,
//!     position INTEGER NOT NULL DEFAULT 0,
//!     created_at TEXT NOT NULL,
//!     deleted_at TEXT
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::task::Task;
use super::{validate_title, PageQuery};
use crate::error::{Error, Result};
use crate::store::filter::{FilterMap, Value};
use crate::store::record::{Fields, Projection, Record};
use crate::store::RecordStore;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TodoList {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub title: String,
    /// Display order chosen by the client
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl Projection for TodoList {
    const COLUMNS: &'static [&'static str] = &["id", "owner_id", "title", "position", "created_at"];
}

impl Fields for TodoList {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("owner_id", self.owner_id.into()),
            ("title", self.title.clone().into()),
            ("position", self.position.into()),
            ("created_at", self.created_at.into()),
        ]
    }
}

impl Record for TodoList {
    const TABLE: &'static str = "todo_lists";
    const SCHEMA: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS todo_lists (
            id BLOB PRIMARY KEY NOT NULL,
            owner_id BLOB NOT NULL,
            title TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
        "CREATE INDEX IF NOT EXISTS todo_lists_owner ON todo_lists (owner_id, created_at)",
    ];
}

/// List changes; an empty title or zero position is left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TodoListPatch {
    pub title: String,
    pub position: i64,
}

impl Fields for TodoListPatch {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("title", self.title.clone().into()),
            ("position", self.position.into()),
        ]
    }
}

fn scoped(owner_id: Uuid, id: Uuid) -> FilterMap {
    FilterMap::new().eq("id", id).eq("owner_id", owner_id)
}

impl TodoList {
    /// Builds an unsaved list
    pub fn new(owner_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            position: 0,
            created_at: Utc::now(),
        }
    }

    pub async fn create(store: &RecordStore, owner_id: Uuid, title: &str) -> Result<Self> {
        validate_title(title, "list")?;

        let list = Self::new(owner_id, title);
        store.create(&list).await?;
        info!(list_id = %list.id, owner_id = %owner_id, "Todo list created");
        Ok(list)
    }

    pub async fn find(store: &RecordStore, owner_id: Uuid, id: Uuid) -> Result<Self> {
        store.read_one(&scoped(owner_id, id)).await
    }

    /// One page of the owner's lists
    ///
    /// `NotFound` when the page is empty.
    pub async fn list(store: &RecordStore, owner_id: Uuid, query: &PageQuery) -> Result<Vec<Self>> {
        let mut filter = FilterMap::new().eq("owner_id", owner_id);
        query.apply(&mut filter);
        store.read_paginated(&filter).await
    }

    /// Renames and/or repositions a list
    pub async fn update(
        store: &RecordStore,
        owner_id: Uuid,
        id: Uuid,
        patch: &TodoListPatch,
    ) -> Result<()> {
        if !patch.title.is_empty() {
            validate_title(&patch.title, "list")?;
        }
        if patch.position < 0 {
            return Err(Error::validation("position must not be negative"));
        }

        store
            .update_whole::<TodoList, _>(&scoped(owner_id, id), patch)
            .await?;
        Ok(())
    }

    /// Soft-deletes a list together with its tasks
    pub async fn delete(store: &RecordStore, owner_id: Uuid, id: Uuid) -> Result<()> {
        store.delete::<TodoList>(&scoped(owner_id, id)).await?;

        match Task::delete_for_list(store, owner_id, id).await {
            Ok(_) | Err(Error::NotFound) => {}
            Err(e) => return Err(e),
        }

        info!(list_id = %id, owner_id = %owner_id, "Todo list deleted");
        Ok(())
    }
}
