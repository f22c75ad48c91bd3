//! Database layer for Graphloom
//!
//! Provides SurrealDB integration with schema management and the graph
//! repository. The store is the single source of truth for the property
//! graph; workers hold no local graph state.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::{DbError, Result};
pub use repository::{GraphMatch, GraphSchema, GraphStats, Repository, UpsertReport};

use std::path::Path;
#[cfg(feature = "rocksdb")]
use surrealdb::engine::local::RocksDb;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::Surreal;

/// Namespace the graph lives in
pub const NAMESPACE: &str = "graphloom";
/// Database name within the namespace
pub const DATABASE: &str = "graph";

/// Database connection type
pub type DbConnection = Surreal<Db>;

/// Initialize database with RocksDB (persistent)
#[cfg(feature = "rocksdb")]
pub async fn init_persistent(path: impl AsRef<Path>) -> Result<DbConnection> {
    let db = Surreal::new::<RocksDb>(path.as_ref()).await?;
    setup_database(&db).await?;
    Ok(db)
}

/// Initialize database in-memory (for testing and throwaway runs)
pub async fn init_memory() -> Result<DbConnection> {
    let db = Surreal::new::<Mem>(()).await?;
    setup_database(&db).await?;
    Ok(db)
}

/// Select namespace and database, then apply the schema
async fn setup_database(db: &DbConnection) -> Result<()> {
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;
    schema::initialize_schema(db).await?;
    Ok(())
}
