use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::{ArchiveError, Result};
use crate::models::{DatasetFile, RetentionWindow};
use crate::utils::filename::hour_key;

/// Result of cleaning one datatype directory
#[derive(Debug)]
pub enum FileCleanup {
    /// Directory absent or not configured
    Skipped,
    Scanned(FileCleanupReport),
    /// Directory could not be reached or listed
    Failed(ArchiveError),
}

#[derive(Debug, Default)]
pub struct FileCleanupReport {
    pub directory: PathBuf,
    pub selected: Vec<String>,
    pub deleted: Vec<String>,
    pub unparseable: Vec<String>,
    pub failures: Vec<ArchiveError>,
}

impl FileCleanup {
    pub fn is_failure(&self) -> bool {
        match self {
            FileCleanup::Skipped => false,
            FileCleanup::Scanned(report) => !report.failures.is_empty(),
            FileCleanup::Failed(_) => true,
        }
    }
}

/// Selection of stale names out of a directory listing
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StaleSelection {
    pub stale: Vec<String>,
    pub unparseable: Vec<String>,
}

pub struct FileRetentionScanner {
    window: RetentionWindow,
    dry_run: bool,
}

impl FileRetentionScanner {
    pub fn new(window: RetentionWindow) -> Self {
        Self {
            window,
            dry_run: false,
        }
    }

    /// List stale files without deleting them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pick the names whose hour lies strictly before `current - window`.
    ///
    /// Every name that contains a stale hour's `YYYYMMDDTHH` key is selected,
    /// so all files of that hour go together regardless of extension.
    /// Names that do not parse are reported and otherwise ignored.
    pub fn select_stale<S: AsRef<str>>(&self, names: &[S], current: DateTime<Utc>) -> StaleSelection {
        let mut unparseable = Vec::new();
        let mut stale_hours = BTreeSet::new();

        for name in names.iter().map(|n| n.as_ref()) {
            match DatasetFile::parse(name) {
                Ok(file) if self.window.is_expired(file.timestamp, current) => {
                    stale_hours.insert(file.timestamp);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping file during retention scan: {}", e);
                    unparseable.push(name.to_string());
                }
            }
        }

        let keys: Vec<String> = stale_hours.into_iter().map(hour_key).collect();
        let stale: BTreeSet<&str> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|name| keys.iter().any(|key| name.contains(key.as_str())))
            .collect();

        StaleSelection {
            stale: stale.into_iter().map(str::to_string).collect(),
            unparseable,
        }
    }

    /// Scan `directory` and delete stale files, one at a time.
    ///
    /// A failed delete is logged and recorded; the remaining files are still
    /// attempted. Only a failure to reach or list the directory is returned
    /// as `Err`.
    pub async fn scan(&self, directory: &Path, current: DateTime<Utc>) -> Result<FileCleanup> {
        if !tokio::fs::try_exists(directory).await? {
            info!("No directory at {}, file cleanup skipped", directory.display());
            return Ok(FileCleanup::Skipped);
        }

        info!("File cleanup started in {}", directory.display());
        let names = list_file_names(directory).await?;
        let selection = self.select_stale(&names, current);

        let mut report = FileCleanupReport {
            directory: directory.to_path_buf(),
            unparseable: selection.unparseable,
            ..Default::default()
        };

        for name in &selection.stale {
            if self.dry_run {
                continue;
            }
            let path = directory.join(name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Deleted file: {}", path.display());
                    report.deleted.push(name.clone());
                }
                Err(source) => {
                    let e = ArchiveError::FileDelete { path, source };
                    error!("{}", e);
                    report.failures.push(e);
                }
            }
        }
        report.selected = selection.stale;

        Ok(FileCleanup::Scanned(report))
    }
}

async fn list_file_names(directory: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(directory).await?;

    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = listed_name(entry.file_name(), entry.file_type().await) {
            names.push(name);
        }
    }

    Ok(names)
}

/// Name of a regular file entry. Entries whose type cannot be read, e.g.
/// removed by a concurrent job, are skipped.
fn listed_name(name: OsString, file_type: std::io::Result<FileType>) -> Option<String> {
    match file_type {
        Ok(file_type) if file_type.is_file() => name.into_string().ok(),
        Ok(_) => None,
        Err(e) => {
            warn!("Skipping {:?} during retention scan: {}", name, e);
            None
        }
    }
}
