//! UTC timestamp value object.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, always UTC.
///
/// Wraps `chrono::DateTime<Utc>` so domain code never touches timezone
/// handling directly. Provider events carry Unix seconds; the store and
/// the wire format use RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Converts provider-style Unix seconds.
    ///
    /// Seconds outside chrono's representable range clamp to the epoch;
    /// the provider never sends such values.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self(DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH))
    }

    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Offsets by whole days; negative values move backwards.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Offsets by seconds; negative values move backwards.
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    // 2024-01-15T00:00:00Z
    const JAN_15: i64 = 1_705_276_800;

    #[test]
    fn unix_secs_roundtrip() {
        let ts = Timestamp::from_unix_secs(JAN_15);
        assert_eq!(ts.as_unix_secs(), JAN_15);
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().month(), 1);
        assert_eq!(ts.as_datetime().day(), 15);
    }

    #[test]
    fn now_is_between_adjacent_reads() {
        let before = Utc::now();
        let ts = Timestamp::now();
        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &Utc::now());
    }

    #[test]
    fn comparison_follows_chronology() {
        let earlier = Timestamp::from_unix_secs(JAN_15);
        let later = earlier.add_secs(1);

        assert!(later.is_after(&earlier));
        assert!(!earlier.is_after(&later));
        assert!(earlier < later);
    }

    #[test]
    fn day_and_second_offsets_compose() {
        let ts = Timestamp::from_unix_secs(JAN_15);
        assert_eq!(ts.add_days(1).as_unix_secs(), JAN_15 + 86_400);
        assert_eq!(ts.add_days(-1).as_unix_secs(), JAN_15 - 86_400);
        assert_eq!(ts.add_secs(90).as_unix_secs(), JAN_15 + 90);
    }

    #[test]
    fn display_and_json_are_rfc3339() {
        let ts = Timestamp::from_unix_secs(JAN_15);
        assert!(ts.to_string().starts_with("2024-01-15T00:00:00"));

        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));

        let parsed: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(parsed.as_datetime().year(), 2024);
    }
}
