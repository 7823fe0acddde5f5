use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info, warn};

use crate::archive::{ArchiveDecision, ArchiveOutcome, Archiver};
use crate::error::{ArchiveError, Result};
use crate::models::{DatasetFile, Job, JobInputs, JobStatus};
use crate::processors::file_retention::{FileCleanup, FileRetentionScanner};
use crate::processors::record_retention::{RecordCleanup, RecordRetentionPurger};
use crate::settings::Settings;
use crate::writers::RecordStore;

/// How a job that got past parsing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Clean,
    /// At least one copy, delete or purge failed
    Partial,
}

#[derive(Debug)]
pub struct DatatypeReport {
    pub datatype: String,
    pub files: FileCleanup,
    pub records: RecordCleanup,
}

#[derive(Debug)]
pub struct JobReport {
    pub dataset: DatasetFile,
    pub current_timestamp: DateTime<Utc>,
    pub archive: ArchiveOutcome,
    pub datatypes: Vec<DatatypeReport>,
}

impl JobReport {
    pub fn completion(&self) -> Completion {
        if self.failures().is_empty() {
            Completion::Clean
        } else {
            Completion::Partial
        }
    }

    /// Every recoverable error absorbed during the job, in stage order
    pub fn failures(&self) -> Vec<&ArchiveError> {
        let mut failures = Vec::new();

        if let ArchiveOutcome::Failed(e) = &self.archive {
            failures.push(e);
        }
        for report in &self.datatypes {
            match &report.files {
                FileCleanup::Scanned(scan) => failures.extend(scan.failures.iter()),
                FileCleanup::Failed(e) => failures.push(e),
                FileCleanup::Skipped => {}
            }
            if let RecordCleanup::Failed(e) = &report.records {
                failures.push(e);
            }
        }

        failures
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Archive Job Report ===\n");
        summary.push_str(&format!("Dataset: {}\n", self.dataset.raw_name));
        summary.push_str(&format!("Region: {}\n", self.dataset.region));
        summary.push_str(&format!("Dataset Hour: {}\n", self.dataset.timestamp));
        summary.push_str(&format!("Current Hour: {}\n", self.current_timestamp));

        let archive = match &self.archive {
            ArchiveOutcome::Archived { path, bytes } => {
                format!("copied to {} ({} bytes)", path.display(), bytes)
            }
            ArchiveOutcome::NotCurrent => "not the current hour, skipped".to_string(),
            ArchiveOutcome::Failed(e) => format!("FAILED: {}", e),
        };
        summary.push_str(&format!("Archive: {}\n", archive));

        for report in &self.datatypes {
            let files = match &report.files {
                FileCleanup::Skipped => "no directory".to_string(),
                FileCleanup::Scanned(scan) => format!(
                    "{} deleted, {} failed, {} unparseable",
                    scan.deleted.len(),
                    scan.failures.len(),
                    scan.unparseable.len()
                ),
                FileCleanup::Failed(e) => format!("FAILED: {}", e),
            };
            let records = match &report.records {
                RecordCleanup::Purged { rows, .. } => format!("{} rows removed", rows),
                RecordCleanup::Failed(e) => format!("FAILED: {}", e),
            };
            summary.push_str(&format!(
                "  {}: files {}; records {}\n",
                report.datatype, files, records
            ));
        }

        summary.push_str(&format!("Completion: {:?}\n", self.completion()));
        summary
    }
}

/// Runs one archival job: decide, copy, then clean every datatype in order.
pub struct ArchivalOrchestrator {
    settings: Settings,
    store: Box<dyn RecordStore>,
}

impl ArchivalOrchestrator {
    pub fn new(settings: Settings, store: impl RecordStore + 'static) -> Self {
        Self {
            settings,
            store: Box::new(store),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process a dispatcher job and set its status.
    ///
    /// The status is `success` whenever the job got past parsing, including
    /// runs where cleanup stages failed; see [`JobReport::completion`].
    pub async fn handle_job(&self, job: &mut Job) -> Result<JobReport> {
        self.handle_job_at(job, Utc::now()).await
    }

    pub async fn handle_job_at(&self, job: &mut Job, now: DateTime<Utc>) -> Result<JobReport> {
        let result = match job.inputs() {
            Ok(inputs) => self.run_at(&inputs, now).await,
            Err(e) => Err(e),
        };

        job.status = match &result {
            Ok(_) => JobStatus::Success,
            Err(_) => JobStatus::Failed,
        };
        result
    }

    pub async fn run(&self, inputs: &JobInputs) -> Result<JobReport> {
        self.run_at(inputs, Utc::now()).await
    }

    /// Run against an explicit clock reading, truncated to the hour once here.
    pub async fn run_at(&self, inputs: &JobInputs, now: DateTime<Utc>) -> Result<JobReport> {
        let dataset = DatasetFile::from_path(&inputs.input_path).map_err(|e| {
            error!("Could not parse dataset timestamp: {}", e);
            ArchiveError::from(e)
        })?;
        let current = crate::utils::truncate_to_hour(now);
        let data_dir = inputs.data_dir.as_path();

        info!(
            "Archiving {} (region {}, hour {}, current hour {})",
            dataset.raw_name, dataset.region, dataset.timestamp, current
        );

        let archive = self.archive_stage(&dataset, data_dir, inputs, current).await;

        let window = self.settings.retention();
        let scanner = FileRetentionScanner::new(window);
        let purger = RecordRetentionPurger::new(window);

        let mut datatypes = Vec::with_capacity(self.settings.datatypes.len());
        for datatype in &self.settings.datatypes {
            let files = match datatype.directory(data_dir, &dataset.region) {
                Some(dir) => scanner.scan(&dir, current).await.unwrap_or_else(|e| {
                    error!("File cleanup failed in {}: {}", dir.display(), e);
                    FileCleanup::Failed(e)
                }),
                None => FileCleanup::Skipped,
            };
            let records = purger
                .purge(self.store.as_ref(), &dataset.region, datatype, current)
                .await;

            datatypes.push(DatatypeReport {
                datatype: datatype.name.clone(),
                files,
                records,
            });
        }

        let report = JobReport {
            dataset,
            current_timestamp: current,
            archive,
            datatypes,
        };

        match report.completion() {
            Completion::Clean => info!("Archiving finished."),
            Completion::Partial => warn!(
                "Archiving finished with {} failure(s).",
                report.failures().len()
            ),
        }

        Ok(report)
    }

    async fn archive_stage(
        &self,
        dataset: &DatasetFile,
        data_dir: &Path,
        inputs: &JobInputs,
        current: DateTime<Utc>,
    ) -> ArchiveOutcome {
        let decision = ArchiveDecision::evaluate(dataset, current);
        let archiver = Archiver::new(self.settings.archive_dir(data_dir));

        let source_dir = match self.settings.source_datatype() {
            Some(source) => source.region_dir(data_dir, &dataset.region),
            None => inputs
                .input_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| data_dir.to_path_buf()),
        };

        let outcome = archiver.archive(&decision, &source_dir).await;
        if let ArchiveOutcome::Failed(e) = &outcome {
            error!(
                "Could not copy dataset with timestamp {}: {}",
                dataset.timestamp, e
            );
        }
        outcome
    }
}
