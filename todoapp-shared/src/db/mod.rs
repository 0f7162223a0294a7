//! Database layer
//!
//! - `pool`: SQLite connection pool with health checks
//! - `schema`: creates every table at start-up
//!
//! ```no_run
//! use todoapp_shared::db::{pool::{create_pool, DatabaseConfig}, schema::ensure_schema};
//! use todoapp_shared::store::RecordStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(DatabaseConfig {
//!         url: std::env::var("DATABASE_URL")?,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     ensure_schema(&RecordStore::new(pool)).await?;
//!     Ok(())
//! }
//! ```

pub mod pool;
pub mod schema;
