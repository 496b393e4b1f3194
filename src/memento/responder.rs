use std::str::FromStr;

use super::datetime::format_http_date;
use super::headers;
use super::{build_links, select_for_request, LinkSet, MementoError};
use crate::models::{Memento, NegotiationRequest, OriginalResource, RevisionTimeline};

/// How a TimeGate answers a request that carries `Accept-Datetime`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProtocolMode {
    /// 302 redirect to the chosen Memento.
    #[default]
    Redirect,
    /// 200 with the chosen Memento served in place (`Content-Location`).
    Direct,
}

impl FromStr for ProtocolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "302" | "redirect" => Ok(Self::Redirect),
            "200" | "direct" => Ok(Self::Direct),
            other => Err(format!("Unknown protocol mode: {}", other)),
        }
    }
}

/// The terminal state a successful negotiation ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Redirect,
    Direct,
}

impl Resolution {
    pub fn status(&self) -> u16 {
        match self {
            Self::Redirect => 302,
            Self::Direct => 200,
        }
    }
}

/// What the host should send back for a resolved negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationResponse {
    pub resolution: Resolution,
    pub status: u16,
    /// The Memento the request resolved to.
    pub memento: Memento,
    pub links: LinkSet,
    /// Response headers in emission order; names are lower-case.
    pub headers: Vec<(&'static str, String)>,
}

impl NegotiationResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Redirect target, set only for [`Resolution::Redirect`].
    pub fn location(&self) -> Option<&str> {
        self.header(headers::LOCATION)
    }
}

/// Drives one TimeGate request from `Accept-Datetime` to a response
/// descriptor.
///
/// `Ok` is a resolved negotiation (redirect or direct), `Err` a rejection the
/// host reports with [`MementoError::status_code`]. The responder keeps no
/// state between requests and can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiationResponder {
    mode: ProtocolMode,
}

impl NegotiationResponder {
    pub fn new(mode: ProtocolMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ProtocolMode {
        self.mode
    }

    /// Negotiate from the raw `Accept-Datetime` header value.
    ///
    /// An empty timeline is rejected before the header is looked at: a
    /// resource without history is unknown whatever date was asked for.
    pub fn respond(
        &self,
        original: &OriginalResource,
        timeline: &RevisionTimeline,
        accept_datetime: Option<&str>,
    ) -> Result<NegotiationResponse, MementoError> {
        if timeline.is_empty() {
            return Err(MementoError::NoMemento);
        }

        let request = NegotiationRequest::from_accept_datetime(accept_datetime).inspect_err(|e| {
            tracing::warn!("Rejecting negotiation for {}: {}", original.uri, e);
        })?;
        self.resolve(original, timeline, &request)
    }

    /// Negotiate an already parsed request.
    pub fn resolve(
        &self,
        original: &OriginalResource,
        timeline: &RevisionTimeline,
        request: &NegotiationRequest,
    ) -> Result<NegotiationResponse, MementoError> {
        let memento = select_for_request(timeline, request)?.clone();
        let links = build_links(original, timeline, Some(&memento));

        let resolution = match (self.mode, request.accept_datetime_header_present) {
            (ProtocolMode::Direct, true) => Resolution::Direct,
            _ => Resolution::Redirect,
        };

        let mut response_headers = Vec::with_capacity(5);
        match resolution {
            Resolution::Redirect => {
                response_headers.push((headers::LOCATION, memento.uri.clone()));
            }
            Resolution::Direct => {
                response_headers.push((headers::CONTENT_LOCATION, memento.uri.clone()));
                response_headers.push((
                    headers::MEMENTO_DATETIME,
                    format_http_date(memento.timestamp),
                ));
            }
        }
        response_headers.push((headers::VARY, headers::ACCEPT_DATETIME.to_string()));
        response_headers.push((headers::LINK, links.to_header_value()));

        tracing::debug!(
            original = %original.uri,
            requested = ?request.target_datetime,
            resolved = %memento.timestamp,
            ?resolution,
            "Negotiated memento {}",
            memento.uri
        );

        Ok(NegotiationResponse {
            resolution,
            status: resolution.status(),
            memento,
            links,
            headers: response_headers,
        })
    }
}

/// Headers for the live Original Resource: its `original`, `timegate` and
/// `timemap` links.
pub fn original_headers(original: &OriginalResource) -> Vec<(&'static str, String)> {
    let links = build_links(original, &RevisionTimeline::default(), None);
    vec![(headers::LINK, links.to_header_value())]
}

/// Headers for a response that serves `memento` itself.
pub fn memento_headers(
    original: &OriginalResource,
    timeline: &RevisionTimeline,
    memento: &Memento,
) -> Vec<(&'static str, String)> {
    let links = build_links(original, timeline, Some(memento));
    vec![
        (headers::MEMENTO_DATETIME, format_http_date(memento.timestamp)),
        (headers::LINK, links.to_header_value()),
    ]
}
