use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, info};

use crate::error::{ArchiveError, Result};
use crate::models::{DatatypeSpec, RetentionWindow};
use crate::utils::constants::CUTOFF_FORMAT;
use crate::writers::RecordStore;

/// A single `DELETE ... WHERE <time_column> < $1` against one table.
///
/// Table and column come from configuration and are checked as plain SQL
/// identifiers before being placed in the statement. The cutoff is always
/// bound as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgePlan {
    pub table: String,
    pub time_column: String,
    pub cutoff: NaiveDateTime,
}

impl PurgePlan {
    pub fn statement(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} < $1",
            self.table, self.time_column
        )
    }

    /// Cutoff as `YYYY-MM-DD HH:MM:SS`
    pub fn cutoff_literal(&self) -> String {
        self.cutoff.format(CUTOFF_FORMAT).to_string()
    }
}

#[derive(Debug)]
pub enum RecordCleanup {
    Purged { table: String, rows: u64 },
    Failed(ArchiveError),
}

impl RecordCleanup {
    pub fn is_failure(&self) -> bool {
        matches!(self, RecordCleanup::Failed(_))
    }
}

pub struct RecordRetentionPurger {
    window: RetentionWindow,
}

impl RecordRetentionPurger {
    pub fn new(window: RetentionWindow) -> Self {
        Self { window }
    }

    pub fn plan(
        &self,
        region: &str,
        datatype: &DatatypeSpec,
        current: DateTime<Utc>,
    ) -> Result<PurgePlan> {
        let table = datatype.table_name(region);
        check_identifier(&table)?;
        check_identifier(&datatype.time_column)?;

        Ok(PurgePlan {
            table,
            time_column: datatype.time_column.clone(),
            cutoff: self.window.cutoff(current).naive_utc(),
        })
    }

    /// Delete expired rows of one datatype. Failures are logged and returned
    /// in the outcome so the caller can move on to the next datatype.
    pub async fn purge(
        &self,
        store: &dyn RecordStore,
        region: &str,
        datatype: &DatatypeSpec,
        current: DateTime<Utc>,
    ) -> RecordCleanup {
        info!("Database cleanup started for {}", datatype.table_name(region));

        let result = match self.plan(region, datatype, current) {
            Ok(plan) => store
                .delete_older_than(&plan)
                .await
                .map(|rows| (plan.table, rows)),
            Err(e) => Err(e),
        };

        match result {
            Ok((table, rows)) => {
                info!("Cleaned up table {}: {} rows removed", table, rows);
                RecordCleanup::Purged { table, rows }
            }
            Err(e) => {
                error!("SQL execution aborted: {}", e);
                RecordCleanup::Failed(e)
            }
        }
    }
}

/// Unquoted Postgres identifier: a letter or `_`, then letters, digits or `_`.
/// Letters include non-ASCII ones, so regions like `köln` are accepted.
fn check_identifier(ident: &str) -> Result<()> {
    let mut chars = ident.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ArchiveError::InvalidIdentifier(ident.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct RecordingStore {
        plans: Mutex<Vec<PurgePlan>>,
        fail: bool,
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        async fn delete_older_than(&self, plan: &PurgePlan) -> Result<u64> {
            self.plans.lock().unwrap().push(plan.clone());
            if self.fail {
                Err(ArchiveError::DbConnect(sqlx::Error::PoolTimedOut))
            } else {
                Ok(7)
            }
        }
    }

    fn current() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 7, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_plan_cutoff_and_statement() {
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("contourlines", "timestamp", false);

        let plan = purger.plan("berlin", &datatype, current()).unwrap();
        assert_eq!(plan.table, "berlin_contourlines");
        assert_eq!(plan.cutoff_literal(), "2023-06-29 11:00:00");
        assert_eq!(
            plan.statement(),
            "DELETE FROM berlin_contourlines WHERE timestamp < $1"
        );
    }

    /// Applies the purge predicate to in-memory rows
    struct RowStore {
        rows: Mutex<Vec<NaiveDateTime>>,
    }

    #[async_trait]
    impl RecordStore for RowStore {
        async fn delete_older_than(&self, plan: &PurgePlan) -> Result<u64> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|row| *row >= plan.cutoff);
            Ok((before - rows.len()) as u64)
        }
    }

    #[tokio::test]
    async fn test_row_at_cutoff_is_retained() {
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("temperature", "time", true);

        let plan = purger.plan("berlin", &datatype, current()).unwrap();
        let cutoff = (current() - chrono::Duration::hours(49)).naive_utc();
        assert_eq!(plan.cutoff, cutoff);
        assert!(plan.statement().ends_with("WHERE time < $1"));

        let at = cutoff;
        let just_before = cutoff - chrono::Duration::seconds(1);
        let just_after = cutoff + chrono::Duration::seconds(1);
        let store = RowStore {
            rows: Mutex::new(vec![just_before, at, just_after]),
        };

        let outcome = purger.purge(&store, "berlin", &datatype, current()).await;
        assert!(matches!(outcome, RecordCleanup::Purged { rows: 1, .. }));
        assert_eq!(*store.rows.lock().unwrap(), vec![at, just_after]);
    }

    #[test]
    fn test_accepts_non_ascii_region() {
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("temperature", "time", true);

        let plan = purger.plan("düsseldorf", &datatype, current()).unwrap();
        assert_eq!(plan.table, "düsseldorf_temperature");
        assert_eq!(
            plan.statement(),
            "DELETE FROM düsseldorf_temperature WHERE time < $1"
        );
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("temperature", "time", true);

        for region in ["bad-homburg", "x; DROP TABLE y", "9lives"] {
            assert!(matches!(
                purger.plan(region, &datatype, current()),
                Err(ArchiveError::InvalidIdentifier(_))
            ));
        }

        let bad_column = DatatypeSpec::new("temperature", "time\"", true);
        assert!(purger.plan("berlin", &bad_column, current()).is_err());
    }

    #[tokio::test]
    async fn test_purge_reports_rows() {
        let store = RecordingStore {
            plans: Mutex::new(Vec::new()),
            fail: false,
        };
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("temperature", "time", true);

        let outcome = purger.purge(&store, "berlin", &datatype, current()).await;
        assert!(matches!(outcome, RecordCleanup::Purged { rows: 7, .. }));
        assert_eq!(store.plans.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_failure_is_absorbed() {
        let store = RecordingStore {
            plans: Mutex::new(Vec::new()),
            fail: true,
        };
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("temperature", "time", true);

        let outcome = purger.purge(&store, "berlin", &datatype, current()).await;
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn test_invalid_region_never_reaches_store() {
        let store = RecordingStore {
            plans: Mutex::new(Vec::new()),
            fail: false,
        };
        let purger = RecordRetentionPurger::new(RetentionWindow::default());
        let datatype = DatatypeSpec::new("temperature", "time", true);

        let outcome = purger.purge(&store, "bad-homburg", &datatype, current()).await;
        assert!(matches!(
            outcome,
            RecordCleanup::Failed(ArchiveError::InvalidIdentifier(_))
        ));
        assert!(store.plans.lock().unwrap().is_empty());
    }
}
