pub mod file_retention;
pub mod orchestrator;
pub mod record_retention;

pub use file_retention::{FileCleanup, FileCleanupReport, FileRetentionScanner, StaleSelection};
pub use orchestrator::{ArchivalOrchestrator, Completion, DatatypeReport, JobReport};
pub use record_retention::{PurgePlan, RecordCleanup, RecordRetentionPurger};
