//! Domain models for the Memento server.
//!
//! # Protocol entities
//!
//! These are read-only, per-request projections built from whatever the
//! revision store hands back. Nothing here is persisted by the negotiation core.
//!
//! - [`Memento`]: one archived state of a resource (URI + timestamp + revision id).
//! - [`RevisionTimeline`]: every Memento of one resource, oldest first.
//! - [`OriginalResource`]: the live URI plus its TimeGate and TimeMap endpoints.
//! - [`NegotiationRequest`]: the parsed `Accept-Datetime` of a TimeGate request.
//!
//! # Store entities
//!
//! - [`Title`]: a normalized, namespace-qualified page name.
//! - [`Page`] and [`Revision`]: rows of the wiki store that back the timelines.

mod negotiation;
mod page;
mod revision;
mod title;

pub use negotiation::*;
pub use page::*;
pub use revision::*;
pub use title::*;
