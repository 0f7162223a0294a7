//! Table bootstrap
//!
//! There are no migrations: each record carries its own idempotent DDL and
//! this module runs it for every table at start-up.

use tracing::info;

use crate::error::Result;
use crate::models::{account::Account, session::Session, task::Task, todo_list::TodoList};
use crate::store::RecordStore;

/// Creates every table and index the application uses
pub async fn ensure_schema(store: &RecordStore) -> Result<()> {
    store.ensure_table::<Account>().await?;
    store.ensure_table::<Session>().await?;
    store.ensure_table::<TodoList>().await?;
    store.ensure_table::<Task>().await?;

    info!("Database schema ready");
    Ok(())
}
