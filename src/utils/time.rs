use chrono::{DateTime, Duration, Timelike, Utc};

/// Truncate an instant to the start of its hour.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use dataset_archiver::utils::truncate_to_hour;
///
/// let t = Utc.with_ymd_and_hms(2023, 6, 29, 5, 30, 12).unwrap();
/// assert_eq!(
///     truncate_to_hour(t),
///     Utc.with_ymd_and_hms(2023, 6, 29, 5, 0, 0).unwrap()
/// );
/// ```
pub fn truncate_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = i64::from(instant.minute() * 60 + instant.second());
    instant - Duration::seconds(into_hour) - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

/// The current wall-clock hour in UTC
pub fn current_hour() -> DateTime<Utc> {
    truncate_to_hour(Utc::now())
}
