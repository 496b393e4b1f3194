//! Memento (RFC 7089) datetime negotiation for a wiki's revision history.
//!
//! The [`memento`] module is the protocol core: it selects revisions, builds
//! Link-format headers and renders TimeMaps without touching HTTP or storage.
//! Everything else ([`db`], [`store`], [`api`]) is the host that feeds it.

pub mod api;
pub mod config;
pub mod db;
pub mod memento;
pub mod models;
pub mod store;
