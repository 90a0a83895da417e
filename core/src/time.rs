//! Time related utils.

use crate::Error;
use chrono::Utc;

/// DateTime is the alias for `chrono::DateTime<Utc>`.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into ISO8601 basic format: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format time into an ISO8601 timestamp with separators and without zone
/// designator: `2011-10-03T15:19:30`
pub fn format_timestamp(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Format time into RFC1123 with a numeric zone: `Tue, 27 Mar 2007 19:36:42 +0000`
pub fn format_rfc1123z(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// Parse time from RFC3339.
///
/// All input time SHOULD be in UTC. If not, we will convert it to UTC.
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("parse {s} into rfc3339 failed")).with_source(e))
}

/// Parse time from RFC2822, which also accepts RFC1123 with either a
/// numeric zone or `GMT`.
pub fn parse_rfc2822(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc2822(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("parse {s} into rfc2822 failed")).with_source(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    #[test]
    fn test_format_iso8601() {
        let t = test_time();
        assert_eq!("20220301T081234Z", format_iso8601(t))
    }

    #[test]
    fn test_format_timestamp() {
        let t = test_time();
        assert_eq!("2022-03-01T08:12:34", format_timestamp(t))
    }

    #[test]
    fn test_format_rfc1123z() {
        let t = test_time();
        assert_eq!("Tue, 01 Mar 2022 08:12:34 +0000", format_rfc1123z(t))
    }

    #[test]
    fn test_parse_round_trip() {
        let t = parse_rfc2822("Tue, 27 Mar 2007 19:36:42 +0000").unwrap();
        assert_eq!(t.timestamp(), 1175024202);
        assert_eq!(format_rfc1123z(t), "Tue, 27 Mar 2007 19:36:42 +0000");

        let t = parse_rfc2822("Thu, 14 Aug 2008 17:08:48 GMT").unwrap();
        assert_eq!(format_rfc1123z(t), "Thu, 14 Aug 2008 17:08:48 +0000");

        let t = parse_rfc3339("2011-09-09T23:36:00Z").unwrap();
        assert_eq!(format_iso8601(t), "20110909T233600Z");
    }
}
