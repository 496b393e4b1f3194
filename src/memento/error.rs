use thiserror::Error;

/// Everything the negotiation core can reject a request with.
///
/// All variants describe the request or the resource, never a transient
/// fault, so none of them is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MementoError {
    #[error("No mementos exist for this resource")]
    NoMemento,

    #[error("Invalid Accept-Datetime value: {0}")]
    InvalidDatetime(String),

    #[error("Cannot render a TimeMap for a resource without revisions")]
    EmptyTimeline,

    #[error("Malformed Link-format document: {0}")]
    InvalidLinkFormat(String),
}

impl MementoError {
    /// HTTP status the host should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoMemento | Self::EmptyTimeline => 404,
            Self::InvalidDatetime(_) | Self::InvalidLinkFormat(_) => 400,
        }
    }
}
