//! Domain records
//!
//! Each model implements [`Record`](crate::store::record::Record) so the
//! [`RecordStore`](crate::store::RecordStore) can create, read, update and
//! soft-delete it. The methods on each model are thin: they build an
//! owner-scoped [`FilterMap`] and call one store operation.
//!
//! # Models
//!
//! - `account`: user accounts, profile patches, email verification
//! - `session`: login sessions and the device-list view
//! - `todo_list`: todo lists owned by an account
//! - `task`: tasks inside a todo list

pub mod account;
pub mod session;
pub mod task;
pub mod todo_list;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::filter::{FilterMap, KEY_COUNT, KEY_ORDER, KEY_PAGE, KEY_SORT_BY};

/// Shortest accepted title, in characters
pub const MIN_TITLE_LEN: usize = 1;
/// Longest accepted title, in characters
pub const MAX_TITLE_LEN: usize = 1000;

/// Default page size for list endpoints
pub const DEFAULT_COUNT: i64 = 10;

/// Rejects titles outside `MIN_TITLE_LEN..=MAX_TITLE_LEN` characters
pub fn validate_title(title: &str, what: &str) -> Result<()> {
    let len = title.chars().count();
    if len < MIN_TITLE_LEN {
        return Err(Error::validation(format!(
            "{what} title has to be at least {MIN_TITLE_LEN} characters long"
        )));
    }
    if len > MAX_TITLE_LEN {
        return Err(Error::validation(format!(
            "{what} title is too long (max {MAX_TITLE_LEN})"
        )));
    }
    Ok(())
}

/// Paging and ordering parameters of a list request
///
/// Deserializes straight from a query string. Missing `page`/`count` fall
/// back to 1 and [`DEFAULT_COUNT`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub count: Option<i64>,
    pub order: Option<String>,
    pub sort_by: Option<String>,
}

impl PageQuery {
    pub fn new(page: i64, count: i64) -> Self {
        Self {
            page: Some(page),
            count: Some(count),
            ..Default::default()
        }
    }

    pub fn sorted(mut self, sort_by: &str, order: &str) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self.order = Some(order.to_string());
        self
    }

    /// Copies the window and sort into `filter` through its reserved keys
    pub fn apply(&self, filter: &mut FilterMap) {
        filter
            .insert(KEY_PAGE, self.page.unwrap_or(1))
            .insert(KEY_COUNT, self.count.unwrap_or(DEFAULT_COUNT));
        if let Some(order) = &self.order {
            filter.insert(KEY_ORDER, order.as_str());
        }
        if let Some(sort_by) = &self.sort_by {
            filter.insert(KEY_SORT_BY, sort_by.as_str());
        }
    }
}
