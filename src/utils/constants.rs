/// Retention horizon applied to both file and record cleanup
pub const RETENTION_HOURS: i64 = 49;

/// Directory names
pub const ARCHIVE_DIR: &str = "archive";

/// Extension of archived snapshots
pub const ARCHIVE_EXTENSION: &str = "tif";

/// Datatype identifiers
pub const DATATYPE_TEMPERATURE: &str = "temperature";
pub const DATATYPE_RECLASSIFIED: &str = "reclassified";
pub const DATATYPE_CONTOURLINES: &str = "contourlines";

/// Database time columns
pub const TIME_COLUMN: &str = "time";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Timestamp layouts
pub const STAMP_FORMAT: &str = "%Y%m%dT%H%M"; // 20230629T0500
pub const HOUR_KEY_FORMAT: &str = "%Y%m%dT%H"; // 20230629T05
pub const CUTOFF_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length of `YYYYMMDDTHHMMZ`
pub const STAMP_LEN: usize = 14;

/// Default database settings
pub const DEFAULT_DB_PORT: u16 = 5432;
