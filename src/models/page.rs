use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Title;

/// A wiki page: the stable identity behind an Original Resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub title: Title,
    /// The revision currently shown at the page's live URI.
    pub latest_revision_id: i64,
    pub created_at: DateTime<Utc>,
}

/// One stored revision of a page. Revisions are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub page_id: i64,
    pub content: String,
    pub comment: Option<String>,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// Input for creating a page together with its first revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePageInput {
    pub title: Title,
    pub content: String,
    pub author: String,
    pub comment: Option<String>,
    /// Explicit revision time, for importing history. Defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Input for appending a revision to an existing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRevisionInput {
    pub content: String,
    pub author: String,
    pub comment: Option<String>,
    /// Explicit revision time, for importing history. Must not precede the
    /// page's latest revision. Defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A page with its revision history, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageHistory {
    #[serde(flatten)]
    pub page: Page,
    pub revisions: Vec<Revision>,
}
