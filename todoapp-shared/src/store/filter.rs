//! Filter maps: the query contract between entities and the record store
//!
//! A [`FilterMap`] holds equality predicates (`column = value`, ANDed) plus at
//! most one sort and one page window. Keys are unique; inserting a key twice
//! keeps the last value.
//!
//! A few keys are reserved and never become equality predicates:
//!
//! | key | effect |
//! |---|---|
//! | `order` | `"asc"` sorts ascending, any other value descending |
//! | `sort_by` | column used by `order`; ignored unless `order` is also set |
//! | `page` | 1-based page number, combined with `count` into an OFFSET |
//! | `count` | page size, becomes LIMIT |
//! | `model` | reserved for choosing a projection; pass the projection type to `read_one_as` / `read_many_as` instead |
//!
//! # Example
//!
//! ```
//! use todoapp_shared::store::filter::{FilterMap, Order};
//! use uuid::Uuid;
//!
//! let owner = Uuid::new_v4();
//! let filter = FilterMap::new()
//!     .eq("owner_id", owner)
//!     .order_by("created_at", Order::Asc)
//!     .paginate(2, 10);
//!
//! assert_eq!(filter.pagination().map(|p| p.offset()), Some(10));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Reserved key selecting the projection shape
pub const KEY_MODEL: &str = "model";
/// Reserved key holding the sort direction
pub const KEY_ORDER: &str = "order";
/// Reserved key naming the sort column
pub const KEY_SORT_BY: &str = "sort_by";
/// Reserved key holding the 1-based page number
pub const KEY_PAGE: &str = "page";
/// Reserved key holding the page size
pub const KEY_COUNT: &str = "count";

/// A column value as bound into a query
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Null,
}

impl Value {
    /// Zero values are skipped by whole-record updates
    ///
    /// Empty text, `0`, `false`, the nil UUID and NULL count as zero.
    /// Timestamps are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Text(s) => s.is_empty(),
            Value::Int(i) => *i == 0,
            Value::Bool(b) => !*b,
            Value::Uuid(u) => u.is_nil(),
            Value::Timestamp(_) => false,
            Value::Null => true,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    /// `"asc"` is ascending; anything else is descending
    pub fn parse(s: &str) -> Self {
        if s == "asc" {
            Order::Asc
        } else {
            Order::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A single ORDER BY clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub order: Order,
}

/// A LIMIT/OFFSET window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number; `None` means the first page
    pub page: Option<i64>,
    /// Page size (LIMIT)
    pub count: i64,
}

impl Pagination {
    /// Rows to skip: `(page - 1) * count`
    pub fn offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1).saturating_mul(self.count)
    }
}

/// Equality predicates plus optional sort and page window
#[derive(Debug, Clone, Default)]
pub struct FilterMap {
    fields: BTreeMap<String, Value>,
    order: Option<Order>,
    sort_by: Option<String>,
    page: Option<i64>,
    count: Option<i64>,
    model: Option<String>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, honouring the reserved keys
    ///
    /// Malformed reserved values (a non-numeric `page`, say) are kept and
    /// reported by [`FilterMap::check`] when the query is built.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();

        match key.as_str() {
            KEY_ORDER => {
                self.order = Some(value.as_text().map(Order::parse).unwrap_or(Order::Desc));
            }
            KEY_SORT_BY => {
                self.sort_by = value.as_text().map(str::to_string);
            }
            KEY_PAGE => {
                self.page = Some(value.as_i64().unwrap_or(i64::MIN));
            }
            KEY_COUNT => {
                self.count = Some(value.as_i64().unwrap_or(i64::MIN));
            }
            KEY_MODEL => {
                self.model = Some(value.as_text().unwrap_or_default().to_string());
            }
            _ => {
                self.fields.insert(key, value);
            }
        }
        self
    }

    /// Builder form of an equality predicate
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Builder form of `order` + `sort_by`
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.sort_by = Some(column.into());
        self.order = Some(order);
        self
    }

    /// Builder form of `page` + `count`
    pub fn paginate(mut self, page: i64, count: i64) -> Self {
        self.page = Some(page);
        self.count = Some(count);
        self
    }

    /// Equality predicates in key order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_predicates(&self) -> bool {
        !self.fields.is_empty()
    }

    /// The sort, present only when both `order` and `sort_by` were given
    pub fn sort(&self) -> Option<Sort> {
        match (&self.sort_by, self.order) {
            (Some(column), Some(order)) => Some(Sort {
                column: column.clone(),
                order,
            }),
            _ => None,
        }
    }

    /// The page window, present only when `count` was given
    pub fn pagination(&self) -> Option<Pagination> {
        self.count.map(|count| Pagination {
            page: self.page,
            count,
        })
    }

    /// Validates the reserved keys and every column against `columns`
    pub fn check(&self, columns: &[&str]) -> Result<()> {
        if let Some(model) = &self.model {
            return Err(Error::validation(format!(
                "'model' ({model}) must be expressed as a projection type"
            )));
        }

        for key in self.fields.keys() {
            ensure_column(columns, key)?;
        }

        if let Some(sort) = self.sort() {
            ensure_column(columns, &sort.column)?;
        }

        if let Some(count) = self.count {
            if count < 1 {
                return Err(Error::validation("count must be a positive integer"));
            }
        }
        if let Some(page) = self.page {
            if page < 1 {
                return Err(Error::validation("page must be a positive integer"));
            }
        }

        Ok(())
    }
}

/// Rejects identifiers that are not declared columns
pub(crate) fn ensure_column(columns: &[&str], name: &str) -> Result<()> {
    if columns.contains(&name) {
        Ok(())
    } else {
        Err(Error::validation(format!("unknown column '{name}'")))
    }
}
