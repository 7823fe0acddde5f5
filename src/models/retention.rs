use chrono::{DateTime, Duration, Utc};

use crate::utils::constants::RETENTION_HOURS;

/// Fixed horizon past which files and rows are purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow(Duration);

impl RetentionWindow {
    /// Saturates at the largest representable duration
    pub fn from_hours(hours: i64) -> Self {
        Self(Duration::try_hours(hours).unwrap_or(Duration::MAX))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Oldest instant still retained, relative to the (hour-aligned) current time
    pub fn cutoff(&self, current: DateTime<Utc>) -> DateTime<Utc> {
        current
            .checked_sub_signed(self.0)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Strictly older than the cutoff; an instant exactly at the cutoff is kept
    pub fn is_expired(&self, timestamp: DateTime<Utc>, current: DateTime<Utc>) -> bool {
        timestamp < self.cutoff(current)
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::from_hours(RETENTION_HOURS)
    }
}
