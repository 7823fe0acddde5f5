use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::FilenameError;
use crate::utils::constants::STAMP_LEN;
use crate::utils::filename::{archive_filename, hour_key};

/// A dataset file identified by its region and the hour it belongs to.
///
/// Parsed from names like `langenfeld_20230629T0500Z.tif`. The timestamp is
/// always the start of the hour; minutes in the name are validated and then
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub region: String,
    pub timestamp: DateTime<Utc>,
    pub raw_name: String,
}

impl DatasetFile {
    /// Parse `<region>_<YYYYMMDD>T<HHMM>Z<suffix>`.
    ///
    /// The region runs up to the first underscore and must not be empty.
    /// Anything after the `Z` is ignored.
    ///
    /// # Examples
    /// ```
    /// use dataset_archiver::models::DatasetFile;
    ///
    /// let file = DatasetFile::parse("berlin_20230629T0530Z.tif").unwrap();
    /// assert_eq!(file.region, "berlin");
    /// assert_eq!(file.timestamp.to_rfc3339(), "2023-06-29T05:00:00+00:00");
    /// ```
    pub fn parse(name: &str) -> Result<Self, FilenameError> {
        let pattern_error = || FilenameError::Pattern(name.to_string());

        let (region, rest) = name.split_once('_').ok_or_else(pattern_error)?;
        if region.is_empty() {
            return Err(pattern_error());
        }

        let stamp = rest.get(..STAMP_LEN).ok_or_else(pattern_error)?;
        let bytes = stamp.as_bytes();
        let well_formed = bytes[..8].iter().all(u8::is_ascii_digit)
            && bytes[8] == b'T'
            && bytes[9..13].iter().all(u8::is_ascii_digit)
            && bytes[13] == b'Z';
        if !well_formed {
            return Err(pattern_error());
        }

        let timestamp = parse_stamp(stamp).ok_or_else(|| FilenameError::InvalidInstant {
            name: name.to_string(),
            stamp: stamp.to_string(),
        })?;

        Ok(Self {
            region: region.to_string(),
            timestamp,
            raw_name: name.to_string(),
        })
    }

    /// Parse the basename of a path
    pub fn from_path(path: &Path) -> Result<Self, FilenameError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FilenameError::Pattern(path.display().to_string()))?;
        Self::parse(name)
    }

    /// `<region>_<YYYYMMDDTHHmm>Z.tif` for this file's hour
    pub fn archive_filename(&self) -> String {
        archive_filename(&self.region, self.timestamp)
    }

    /// `YYYYMMDDTHH` for this file's hour
    pub fn hour_key(&self) -> String {
        hour_key(self.timestamp)
    }
}

impl FromStr for DatasetFile {
    type Err = FilenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Read `YYYYMMDDTHHMMZ` (already checked for shape) as an hour-aligned UTC instant.
fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    let year = stamp[0..4].parse::<i32>().ok()?;
    let month = stamp[4..6].parse::<u32>().ok()?;
    let day = stamp[6..8].parse::<u32>().ok()?;
    let hour = stamp[9..11].parse::<u32>().ok()?;
    let minute = stamp[11..13].parse::<u32>().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    // Validate the full time, then keep only the hour
    NaiveTime::from_hms_opt(hour, minute, 0)?;
    let hour_start = date.and_hms_opt(hour, 0, 0)?;

    Some(Utc.from_utc_datetime(&hour_start))
}
