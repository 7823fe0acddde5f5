use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Job object handed over by the dispatcher.
///
/// `inputs[0]` is the newly arrived file, `inputs[1]` the final data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub status: JobStatus,

    #[serde(default)]
    pub inputs: Vec<String>,
}

impl Job {
    pub fn new(inputs: Vec<String>) -> Self {
        Self {
            id: None,
            status: JobStatus::Pending,
            inputs,
        }
    }

    pub fn inputs(&self) -> Result<JobInputs> {
        let input = |i: usize| {
            self.inputs
                .get(i)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .ok_or(ArchiveError::MissingInput(i))
        };

        Ok(JobInputs {
            input_path: input(0)?,
            data_dir: input(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInputs {
    pub input_path: PathBuf,
    pub data_dir: PathBuf,
}

impl JobInputs {
    pub fn new(input_path: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            data_dir: data_dir.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_json_round_trip_status() {
        let job: Job = serde_json::from_str(
            r#"{"id":"42","inputs":["/data/berlin/berlin_temperature/berlin_20230629T0500Z.tif","/data"]}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let inputs = job.inputs().unwrap();
        assert_eq!(inputs.data_dir, PathBuf::from("/data"));

        let mut done = job.clone();
        done.status = JobStatus::Success;
        let json = serde_json::to_string(&done).unwrap();
        assert!(json.contains(r#""status":"success""#));
    }

    #[test]
    fn test_missing_inputs() {
        let job = Job::new(vec!["/data/x.tif".to_string()]);
        assert!(matches!(job.inputs(), Err(ArchiveError::MissingInput(1))));

        let job = Job::new(vec![String::new(), "/data".to_string()]);
        assert!(matches!(job.inputs(), Err(ArchiveError::MissingInput(0))));
    }
}
