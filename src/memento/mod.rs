//! The Memento negotiation core.
//!
//! Pure computation over request-scoped inputs: nothing in here performs I/O,
//! holds state between calls, or knows about axum or SQLite. The host fetches
//! a [`RevisionTimeline`](crate::models::RevisionTimeline), then calls
//!
//! - [`NegotiationResponder`] for a TimeGate interaction,
//! - [`render_time_map`] for a TimeMap interaction, or
//! - [`build_links`] / [`memento_headers`] to annotate an Original Resource or
//!   Memento response,
//!
//! and copies the returned status and headers onto its own response.

pub mod datetime;
mod error;
mod links;
mod negotiator;
mod responder;
mod timemap;

pub use error::*;
pub use links::*;
pub use negotiator::*;
pub use responder::*;
pub use timemap::*;

/// Header names produced by the core, lower-cased as HTTP/2 requires.
pub mod headers {
    pub const ACCEPT_DATETIME: &str = "accept-datetime";
    pub const CONTENT_LOCATION: &str = "content-location";
    pub const LINK: &str = "link";
    pub const LOCATION: &str = "location";
    pub const MEMENTO_DATETIME: &str = "memento-datetime";
    pub const VARY: &str = "vary";
}
