//! Database Module
//!
//! Embedded SurrealDB storage. The document store is the single
//! source of truth; the cache layer is a disposable projection.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::AppError;

const NS: &str = "consign";
const DB: &str = "marketplace";

/// Open the embedded database under the work directory
pub async fn connect(work_dir: &str) -> Result<Surreal<Db>, AppError> {
    let db_path = Path::new(work_dir).join("db");
    let db = Surreal::new::<RocksDb>(db_path)
        .await
        .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;
    db.use_ns(NS)
        .use_db(DB)
        .await
        .map_err(|e| AppError::Database(format!("Failed to select namespace: {e}")))?;

    tracing::info!("Database connection established (embedded SurrealDB)");
    Ok(db)
}

/// In-memory database for tests
#[cfg(test)]
pub async fn connect_mem() -> Surreal<Db> {
    use surrealdb::engine::local::Mem;

    let db = Surreal::new::<Mem>(()).await.expect("mem db");
    db.use_ns(NS).use_db(DB).await.expect("mem ns");
    db
}
