use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tracing::{debug, warn};

use crate::error::{ArchiveError, Result};
use crate::processors::record_retention::PurgePlan;

/// Executes purge plans against persisted rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Delete the rows selected by `plan`, returning how many were removed
    async fn delete_older_than(&self, plan: &PurgePlan) -> Result<u64>;
}

/// PostgreSQL store opening one connection per delete.
pub struct PgRecordStore {
    options: PgConnectOptions,
}

impl PgRecordStore {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn delete_older_than(&self, plan: &PurgePlan) -> Result<u64> {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(ArchiveError::DbConnect)?;

        let sql = plan.statement();
        debug!("{} [$1 = {}]", sql, plan.cutoff_literal());
        let result = sqlx::query(&sql)
            .bind(plan.cutoff)
            .execute(&mut conn)
            .await;

        // Released whether or not the delete succeeded
        if let Err(e) = conn.close().await {
            warn!("Closing database connection failed: {}", e);
        }

        let done = result.map_err(|source| ArchiveError::DbQuery {
            table: plan.table.clone(),
            source,
        })?;

        Ok(done.rows_affected())
    }
}
