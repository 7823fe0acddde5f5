use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ArchiveError, Result};
use crate::models::DatasetFile;

/// Whether an incoming dataset is the snapshot for the current hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDecision {
    pub region: String,
    pub dataset_timestamp: DateTime<Utc>,
    pub current_timestamp: DateTime<Utc>,
    /// Set only when the dataset belongs to the current hour
    pub archive_filename: Option<String>,
}

impl ArchiveDecision {
    /// Both timestamps are expected to be hour-aligned.
    pub fn evaluate(dataset: &DatasetFile, current: DateTime<Utc>) -> Self {
        let archive_filename = (dataset.timestamp == current).then(|| dataset.archive_filename());

        Self {
            region: dataset.region.clone(),
            dataset_timestamp: dataset.timestamp,
            current_timestamp: current,
            archive_filename,
        }
    }

    pub fn should_archive(&self) -> bool {
        self.archive_filename.is_some()
    }
}

#[derive(Debug)]
pub enum ArchiveOutcome {
    Archived { path: PathBuf, bytes: u64 },
    NotCurrent,
    Failed(ArchiveError),
}

impl ArchiveOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ArchiveOutcome::Failed(_))
    }
}

/// Copies current-hour snapshots from a datatype directory into the archive.
pub struct Archiver {
    archive_dir: PathBuf,
}

impl Archiver {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Copy `<source_dir>/<archive_filename>` into the archive when the
    /// decision says so. Errors are returned in the outcome, never raised.
    pub async fn archive(&self, decision: &ArchiveDecision, source_dir: &Path) -> ArchiveOutcome {
        let Some(file_name) = &decision.archive_filename else {
            debug!(
                "Dataset hour {} is not current hour {}, not archiving",
                decision.dataset_timestamp, decision.current_timestamp
            );
            return ArchiveOutcome::NotCurrent;
        };

        match self.copy_into_archive(&source_dir.join(file_name), file_name).await {
            Ok((path, bytes)) => {
                info!("Archived {} ({} bytes)", path.display(), bytes);
                ArchiveOutcome::Archived { path, bytes }
            }
            Err(e) => ArchiveOutcome::Failed(e),
        }
    }

    async fn copy_into_archive(&self, source: &Path, file_name: &str) -> Result<(PathBuf, u64)> {
        // create_dir_all tolerates an existing directory
        tokio::fs::create_dir_all(&self.archive_dir)
            .await
            .map_err(|source| ArchiveError::ArchiveCopy {
                path: self.archive_dir.clone(),
                source,
            })?;

        let target = self.archive_dir.join(file_name);
        let bytes = tokio::fs::copy(source, &target)
            .await
            .map_err(|e| ArchiveError::ArchiveCopy {
                path: source.to_path_buf(),
                source: e,
            })?;

        Ok((target, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 29, h, 0, 0).unwrap()
    }

    #[test]
    fn test_current_hour_is_archived() {
        let dataset = DatasetFile::parse("berlin_20230629T0500Z.tif").unwrap();
        let decision = ArchiveDecision::evaluate(&dataset, hour(5));
        assert!(decision.should_archive());
        assert_eq!(
            decision.archive_filename.as_deref(),
            Some("berlin_20230629T0500Z.tif")
        );
    }

    #[test]
    fn test_late_arrival_is_not_archived() {
        let dataset = DatasetFile::parse("berlin_20230629T0500Z.tif").unwrap();
        let decision = ArchiveDecision::evaluate(&dataset, hour(6));
        assert!(!decision.should_archive());
        assert_eq!(decision.archive_filename, None);
    }

    #[test]
    fn test_archive_name_uses_hour_not_source_minutes() {
        let dataset = DatasetFile::parse("berlin_20230629T0547Z.tif").unwrap();
        let decision = ArchiveDecision::evaluate(&dataset, hour(5));
        assert_eq!(
            decision.archive_filename.as_deref(),
            Some("berlin_20230629T0500Z.tif")
        );
    }

    #[tokio::test]
    async fn test_archive_creates_directory_and_overwrites() {
        let data = TempDir::new().unwrap();
        let source_dir = data.path().join("berlin").join("berlin_temperature");
        std::fs::create_dir_all(&source_dir).unwrap();
        std::fs::write(source_dir.join("berlin_20230629T0500Z.tif"), b"raster-v1").unwrap();

        let archiver = Archiver::new(data.path().join("archive"));
        let dataset = DatasetFile::parse("berlin_20230629T0500Z.tif").unwrap();
        let decision = ArchiveDecision::evaluate(&dataset, hour(5));

        let first = archiver.archive(&decision, &source_dir).await;
        assert!(matches!(first, ArchiveOutcome::Archived { bytes: 9, .. }));

        std::fs::write(source_dir.join("berlin_20230629T0500Z.tif"), b"raster-v2").unwrap();
        let second = archiver.archive(&decision, &source_dir).await;
        assert!(matches!(second, ArchiveOutcome::Archived { .. }));

        let archived =
            std::fs::read(data.path().join("archive").join("berlin_20230629T0500Z.tif")).unwrap();
        assert_eq!(archived, b"raster-v2");
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let data = TempDir::new().unwrap();
        let archiver = Archiver::new(data.path().join("archive"));
        let dataset = DatasetFile::parse("berlin_20230629T0500Z.tif").unwrap();
        let decision = ArchiveDecision::evaluate(&dataset, hour(5));

        let outcome = archiver
            .archive(&decision, &data.path().join("berlin").join("berlin_temperature"))
            .await;
        assert!(matches!(
            outcome,
            ArchiveOutcome::Failed(ArchiveError::ArchiveCopy { .. })
        ));
        assert!(data.path().join("archive").is_dir());
    }

    #[tokio::test]
    async fn test_not_current_touches_nothing() {
        let data = TempDir::new().unwrap();
        let archiver = Archiver::new(data.path().join("archive"));
        let dataset = DatasetFile::parse("berlin_20230629T0500Z.tif").unwrap();
        let decision = ArchiveDecision::evaluate(&dataset, hour(7));

        let outcome = archiver.archive(&decision, data.path()).await;
        assert!(matches!(outcome, ArchiveOutcome::NotCurrent));
        assert!(!data.path().join("archive").exists());
    }
}
