use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memento::{datetime, MementoError};

/// A parsed TimeGate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationRequest {
    /// Requested point in time; `None` means "now", i.e. the latest Memento.
    pub target_datetime: Option<DateTime<Utc>>,
    /// Whether the client sent `Accept-Datetime` at all. In 200-style
    /// negotiation this is what selects a direct response over a redirect.
    pub accept_datetime_header_present: bool,
}

impl NegotiationRequest {
    /// Parse the raw `Accept-Datetime` header value, if one was sent.
    pub fn from_accept_datetime(header: Option<&str>) -> Result<Self, MementoError> {
        match header {
            None => Ok(Self::latest()),
            Some(value) => Ok(Self::at(datetime::parse_http_date(value)?)),
        }
    }

    /// A bare request with no `Accept-Datetime`.
    pub fn latest() -> Self {
        Self {
            target_datetime: None,
            accept_datetime_header_present: false,
        }
    }

    /// A request for the state at `target`.
    pub fn at(target: DateTime<Utc>) -> Self {
        Self {
            target_datetime: Some(target),
            accept_datetime_header_present: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_header_requests_latest() {
        let request = NegotiationRequest::from_accept_datetime(None).unwrap();
        assert_eq!(request, NegotiationRequest::latest());
        assert!(!request.accept_datetime_header_present);
    }

    #[test]
    fn header_is_parsed_as_http_date() {
        let request =
            NegotiationRequest::from_accept_datetime(Some("Sat, 10 Aug 2013 00:00:00 GMT"))
                .unwrap();
        assert_eq!(
            request.target_datetime,
            Some(Utc.with_ymd_and_hms(2013, 8, 10, 0, 0, 0).unwrap())
        );
        assert!(request.accept_datetime_header_present);
    }

    #[test]
    fn malformed_header_is_invalid_datetime() {
        let err = NegotiationRequest::from_accept_datetime(Some("not-a-date")).unwrap_err();
        assert!(matches!(err, MementoError::InvalidDatetime(_)));
    }
}
