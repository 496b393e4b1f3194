//! HTTP-date handling (RFC 7231 §7.1.1.1).
//!
//! Output is always IMF-fixdate. Input additionally accepts the two obsolete
//! forms every HTTP recipient must still understand.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::MementoError;

/// `Sat, 10 Aug 2013 00:00:00 GMT`
pub const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// `Saturday, 10-Aug-13 00:00:00 GMT`
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// `Sat Aug 10 00:00:00 2013`
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

pub fn format_http_date(datetime: DateTime<Utc>) -> String {
    datetime.format(IMF_FIXDATE).to_string()
}

/// Parse an HTTP-date. The weekday must agree with the date.
pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>, MementoError> {
    let value = value.trim();

    [IMF_FIXDATE, RFC_850, ASCTIME]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| MementoError::InvalidDatetime(value.to_string()))
}
