//! Generic record store
//!
//! One query path for every entity: a [`Record`] type names the table and
//! its columns, a [`FilterMap`] scopes the rows, and the store builds the SQL
//! with sqlx's `QueryBuilder`. Values are always bound; identifiers are
//! checked against the record's declared columns first.
//!
//! Deletes are soft (they stamp `deleted_at`), and every operation ignores
//! rows that have been soft-deleted.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (nanosecond
//! precision, `Z` suffix), so sorting on a timestamp column is chronological.
//!
//! Every read, update and delete returns [`Error::NotFound`] when zero rows
//! matched, so callers can tell "nothing there" from a store failure.
//!
//! # Example
//!
//! ```no_run
//! use todoapp_shared::db::pool::{create_pool, DatabaseConfig};
//! use todoapp_shared::models::todo_list::TodoList;
//! use todoapp_shared::store::{filter::FilterMap, RecordStore};
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::in_memory()).await?;
//! let store = RecordStore::new(pool);
//! store.ensure_table::<TodoList>().await?;
//!
//! let owner = Uuid::new_v4();
//! let list = TodoList::new(owner, "Groceries");
//! store.create(&list).await?;
//!
//! let found: TodoList = store
//!     .read_one(&FilterMap::new().eq("id", list.id).eq("owner_id", owner))
//!     .await?;
//! assert_eq!(found.title, "Groceries");
//! # Ok(())
//! # }
//! ```

pub mod filter;
pub mod record;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{Error, Result};
use filter::{ensure_column, FilterMap, Value};
use record::{Fields, Projection, Record, DELETED_AT};

/// Handle to the relational store
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for health checks and shutdown
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the record's table and indexes if they do not exist
    pub async fn ensure_table<R: Record>(&self) -> Result<()> {
        debug!(table = R::TABLE, "Ensuring table exists");
        for statement in R::SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Inserts one row
    ///
    /// # Errors
    ///
    /// `Conflict` on a unique-constraint violation, `Store` otherwise.
    pub async fn create<R: Record>(&self, record: &R) -> Result<()> {
        let fields = record.fields();
        for (column, _) in &fields {
            ensure_column(R::COLUMNS, column)?;
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {} (", R::TABLE));
        for (i, (column, _)) in fields.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(")");

        debug!(table = R::TABLE, "Creating record");
        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    /// First row matching the filter
    pub async fn read_one<R: Record>(&self, filter: &FilterMap) -> Result<R> {
        self.read_one_as::<R, R>(filter).await
    }

    /// First row matching the filter, decoded as projection `V`
    pub async fn read_one_as<R: Record, V: Projection>(&self, filter: &FilterMap) -> Result<V> {
        filter.check(R::COLUMNS)?;
        let mut qb = select::<R, V>()?;
        push_where(&mut qb, filter);
        push_sort(&mut qb, filter);
        qb.push(" LIMIT 1");

        debug!(table = R::TABLE, "Reading one record");
        qb.build_query_as::<V>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound)
    }

    /// All rows matching the filter; sort honoured, pagination ignored
    pub async fn read_many<R: Record>(&self, filter: &FilterMap) -> Result<Vec<R>> {
        self.read_many_as::<R, R>(filter).await
    }

    /// All rows matching the filter, decoded as projection `V`
    pub async fn read_many_as<R: Record, V: Projection>(
        &self,
        filter: &FilterMap,
    ) -> Result<Vec<V>> {
        filter.check(R::COLUMNS)?;
        let mut qb = select::<R, V>()?;
        push_where(&mut qb, filter);
        push_sort(&mut qb, filter);

        debug!(table = R::TABLE, "Reading records");
        non_empty(qb.build_query_as::<V>().fetch_all(&self.pool).await?)
    }

    /// Rows matching the filter within the `page`/`count` window
    pub async fn read_paginated<R: Record>(&self, filter: &FilterMap) -> Result<Vec<R>> {
        filter.check(R::COLUMNS)?;
        let mut qb = select::<R, R>()?;
        push_where(&mut qb, filter);
        push_sort(&mut qb, filter);

        if let Some(page) = filter.pagination() {
            debug!(
                table = R::TABLE,
                page = ?page.page,
                count = page.count,
                offset = page.offset(),
                "Reading page"
            );
            qb.push(" LIMIT ");
            qb.push_bind(page.count);
            qb.push(" OFFSET ");
            qb.push_bind(page.offset());
        }

        non_empty(qb.build_query_as::<R>().fetch_all(&self.pool).await?)
    }

    /// Overwrites every non-zero field of `source` on the matched rows
    ///
    /// Returns the number of rows matched. When `source` has nothing
    /// non-zero to write, the filter is still checked for a match.
    pub async fn update_whole<R: Record, F: Fields>(
        &self,
        filter: &FilterMap,
        source: &F,
    ) -> Result<u64> {
        let fields = source
            .fields()
            .into_iter()
            .filter(|(_, value)| !value.is_zero())
            .collect();
        self.update_fields::<R>(filter, fields).await
    }

    /// Writes every field `submodel` declares, zero values included
    pub async fn update_submodel<R: Record, F: Fields>(
        &self,
        filter: &FilterMap,
        submodel: &F,
    ) -> Result<u64> {
        self.update_fields::<R>(filter, submodel.fields()).await
    }

    /// Soft-deletes the matched rows
    pub async fn delete<R: Record>(&self, filter: &FilterMap) -> Result<u64> {
        filter.check(R::COLUMNS)?;
        require_scope::<R>(filter)?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET {DELETED_AT} = ", R::TABLE));
        push_value(&mut qb, Utc::now().into());
        push_where(&mut qb, filter);

        debug!(table = R::TABLE, "Deleting records");
        affected(qb.build().execute(&self.pool).await?.rows_affected())
    }

    /// Soft-deletes every matched row except the one where
    /// `except_column = except_value`
    pub async fn delete_all_except_one<R: Record>(
        &self,
        filter: &FilterMap,
        except_column: &str,
        except_value: impl Into<Value>,
    ) -> Result<u64> {
        filter.check(R::COLUMNS)?;
        require_scope::<R>(filter)?;
        ensure_column(R::COLUMNS, except_column)?;

        let except_value = except_value.into();
        if except_value == Value::Null {
            return Err(Error::validation("excluded value must not be NULL"));
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET {DELETED_AT} = ", R::TABLE));
        push_value(&mut qb, Utc::now().into());
        push_where(&mut qb, filter);
        qb.push(" AND ");
        qb.push(except_column);
        qb.push(" != ");
        push_value(&mut qb, except_value);

        debug!(table = R::TABLE, except_column, "Deleting all records but one");
        affected(qb.build().execute(&self.pool).await?.rows_affected())
    }

    /// Number of live rows matching the filter's predicates
    pub async fn count<R: Record>(&self, filter: &FilterMap) -> Result<i64> {
        filter.check(R::COLUMNS)?;
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
        push_where(&mut qb, filter);

        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn update_fields<R: Record>(
        &self,
        filter: &FilterMap,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<u64> {
        filter.check(R::COLUMNS)?;
        require_scope::<R>(filter)?;

        let fields: Vec<_> = fields
            .into_iter()
            .filter(|(column, _)| *column != R::KEY)
            .collect();
        for (column, _) in &fields {
            ensure_column(R::COLUMNS, column)?;
        }

        if fields.is_empty() {
            debug!(table = R::TABLE, "Nothing to update, checking for a match");
            return match self.count::<R>(filter).await? {
                0 => Err(Error::NotFound),
                _ => Ok(0),
            };
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", R::TABLE));
        for (i, (column, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(column);
            qb.push(" = ");
            push_value(&mut qb, value);
        }
        push_where(&mut qb, filter);

        debug!(table = R::TABLE, "Updating records");
        affected(qb.build().execute(&self.pool).await?.rows_affected())
    }
}

fn select<R: Record, V: Projection>() -> Result<QueryBuilder<'static, Sqlite>> {
    for column in V::COLUMNS {
        ensure_column(R::COLUMNS, column)?;
    }
    Ok(QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        V::COLUMNS.join(", "),
        R::TABLE
    )))
}

fn push_where(qb: &mut QueryBuilder<'_, Sqlite>, filter: &FilterMap) {
    qb.push(" WHERE ");
    qb.push(DELETED_AT);
    qb.push(" IS NULL");

    for (column, value) in filter.fields() {
        qb.push(" AND ");
        qb.push(column);
        if *value == Value::Null {
            qb.push(" IS NULL");
        } else {
            qb.push(" = ");
            push_value(qb, value.clone());
        }
    }
}

fn push_sort(qb: &mut QueryBuilder<'_, Sqlite>, filter: &FilterMap) {
    if let Some(sort) = filter.sort() {
        qb.push(" ORDER BY ");
        qb.push(sort.column);
        qb.push(" ");
        qb.push(sort.order.as_sql());
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: Value) {
    match value {
        Value::Text(v) => qb.push_bind(v),
        Value::Int(v) => qb.push_bind(v),
        Value::Bool(v) => qb.push_bind(v),
        Value::Uuid(v) => qb.push_bind(v),
        Value::Timestamp(v) => qb.push_bind(timestamp_text(v)),
        Value::Null => qb.push_bind(None::<String>),
    };
}

/// Fixed-width RFC 3339 so text order matches time order
fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Mutations must carry at least one equality predicate
fn require_scope<R: Record>(filter: &FilterMap) -> Result<()> {
    if filter.has_predicates() {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "refusing to modify {} without a filter",
            R::TABLE
        )))
    }
}

fn non_empty<T>(rows: Vec<T>) -> Result<Vec<T>> {
    if rows.is_empty() {
        Err(Error::NotFound)
    } else {
        Ok(rows)
    }
}

fn affected(rows: u64) -> Result<u64> {
    if rows == 0 {
        Err(Error::NotFound)
    } else {
        Ok(rows)
    }
}
