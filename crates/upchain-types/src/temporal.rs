use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Textual layout used both for hashing and for storage.
const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Creation instant of a block.
///
/// Held in UTC and truncated to microseconds on construction, so the canonical
/// text form (`YYYY-MM-DD HH:MM:SS.ffffff`) is lossless. The block hash covers
/// that text, which means any store that keeps the canonical string reproduces
/// the exact hash on reload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockTimestamp(DateTime<Utc>);

impl BlockTimestamp {
    /// The current wall-clock instant.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wrap an instant, dropping sub-microsecond precision.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(6))
    }

    /// Parse the canonical text form. Fewer than six fractional digits (or
    /// none) are accepted; extra precision is truncated.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let naive = NaiveDateTime::parse_from_str(s, PARSE_FORMAT).map_err(|e| {
            TypeError::InvalidTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::from_datetime(naive.and_utc()))
    }

    /// Canonical text form, always with six fractional digits.
    pub fn canonical(&self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Debug for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockTimestamp({})", self.canonical())
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl TryFrom<String> for BlockTimestamp {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlockTimestamp> for String {
    fn from(ts: BlockTimestamp) -> Self {
        ts.canonical()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn canonical_has_six_fraction_digits() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let ts = BlockTimestamp::from_datetime(at);
        assert_eq!(ts.canonical(), "2024-03-09 07:05:01.000000");
    }

    #[test]
    fn nanoseconds_are_truncated() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let ts = BlockTimestamp::from_datetime(at);
        assert_eq!(ts.canonical(), "2023-11-14 22:13:20.123456");
    }

    #[test]
    fn parse_accepts_short_fraction_and_none() {
        let a = BlockTimestamp::parse("2024-01-02 03:04:05.5").unwrap();
        assert_eq!(a.canonical(), "2024-01-02 03:04:05.500000");
        let b = BlockTimestamp::parse("2024-01-02 03:04:05").unwrap();
        assert_eq!(b.canonical(), "2024-01-02 03:04:05.000000");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = BlockTimestamp::parse("yesterday").unwrap_err();
        assert!(matches!(err, TypeError::InvalidTimestamp { .. }));
    }

    #[test]
    fn now_is_microsecond_aligned() {
        let ts = BlockTimestamp::now();
        assert_eq!(ts.as_datetime().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn serde_uses_canonical_text() {
        let ts = BlockTimestamp::parse("2024-06-01 12:00:00.000042").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-06-01 12:00:00.000042\"");
        let parsed: BlockTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }

    proptest! {
        #[test]
        fn canonical_text_roundtrips(secs in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
            let at = Utc.timestamp_opt(secs, nanos).unwrap();
            let ts = BlockTimestamp::from_datetime(at);
            let reparsed = BlockTimestamp::parse(&ts.canonical()).unwrap();
            prop_assert_eq!(reparsed, ts);
        }
    }
}
