use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::utils::constants::{
    DATATYPE_CONTOURLINES, DATATYPE_RECLASSIFIED, DATATYPE_TEMPERATURE, TIMESTAMP_COLUMN,
    TIME_COLUMN,
};
use crate::utils::filename::datatype_dir_name;

/// One data category kept per region, with its own table and optionally its
/// own directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DatatypeSpec {
    #[validate(length(min = 1))]
    pub name: String,

    /// Column compared against the retention cutoff
    #[validate(length(min = 1))]
    pub time_column: String,

    /// Whether files of this datatype live under `<region>/<region>_<name>/`
    #[serde(default)]
    pub on_disk: bool,
}

impl DatatypeSpec {
    pub fn new(name: &str, time_column: &str, on_disk: bool) -> Self {
        Self {
            name: name.to_string(),
            time_column: time_column.to_string(),
            on_disk,
        }
    }

    /// Temperature, reclassified and contourlines, in cleanup order
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(DATATYPE_TEMPERATURE, TIME_COLUMN, true),
            Self::new(DATATYPE_RECLASSIFIED, TIME_COLUMN, true),
            Self::new(DATATYPE_CONTOURLINES, TIMESTAMP_COLUMN, false),
        ]
    }

    /// Table holding this datatype's rows for a region: `<region>_<name>`
    pub fn table_name(&self, region: &str) -> String {
        datatype_dir_name(region, &self.name)
    }

    /// `<data_dir>/<region>/<region>_<name>`, whether or not it exists
    pub fn region_dir(&self, data_dir: &Path, region: &str) -> PathBuf {
        data_dir
            .join(region)
            .join(datatype_dir_name(region, &self.name))
    }

    /// Directory to scan during file cleanup, if this datatype has one
    pub fn directory(&self, data_dir: &Path, region: &str) -> Option<PathBuf> {
        self.on_disk.then(|| self.region_dir(data_dir, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_order_and_columns() {
        let defaults = DatatypeSpec::defaults();
        let names: Vec<_> = defaults.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["temperature", "reclassified", "contourlines"]);
        assert_eq!(defaults[2].time_column, "timestamp");
        assert!(!defaults[2].on_disk);
        assert!(defaults.iter().all(|d| d.validate().is_ok()));
    }

    #[test]
    fn test_table_and_directory() {
        let temperature = DatatypeSpec::new("temperature", "time", true);
        assert_eq!(temperature.table_name("berlin"), "berlin_temperature");
        assert_eq!(
            temperature.directory(Path::new("/data"), "berlin"),
            Some(PathBuf::from("/data/berlin/berlin_temperature"))
        );

        let contourlines = DatatypeSpec::new("contourlines", "timestamp", false);
        assert_eq!(contourlines.directory(Path::new("/data"), "berlin"), None);
    }

    #[test]
    fn test_missing_time_column_fails_validation() {
        let spec = DatatypeSpec::new("temperature", "", true);
        assert!(spec.validate().is_err());
    }
}
