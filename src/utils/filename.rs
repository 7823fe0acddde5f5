use crate::utils::constants::{ARCHIVE_EXTENSION, HOUR_KEY_FORMAT, STAMP_FORMAT};
use chrono::{DateTime, Utc};

/// Generate the archive filename with format: {region}_{YYYYMMDDTHHmm}Z.tif
pub fn archive_filename(region: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}_{}Z.{}",
        region,
        timestamp.format(STAMP_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// Hour-precision key ({YYYYMMDDTHH}) used to match every file of one hour
pub fn hour_key(timestamp: DateTime<Utc>) -> String {
    timestamp.format(HOUR_KEY_FORMAT).to_string()
}

/// Directory name for one datatype of a region: {region}_{datatype}
pub fn datatype_dir_name(region: &str, datatype: &str) -> String {
    format!("{}_{}", region, datatype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_archive_filename() {
        let ts = Utc.with_ymd_and_hms(2023, 6, 29, 5, 0, 0).unwrap();
        assert_eq!(archive_filename("berlin", ts), "berlin_20230629T0500Z.tif");
    }

    #[test]
    fn test_hour_key() {
        let ts = Utc.with_ymd_and_hms(2023, 1, 2, 7, 0, 0).unwrap();
        assert_eq!(hour_key(ts), "20230102T07");
    }

    #[test]
    fn test_datatype_dir_name() {
        assert_eq!(
            datatype_dir_name("langenfeld", "temperature"),
            "langenfeld_temperature"
        );
    }
}
