//! The seam between the negotiation core and wherever revisions live.

use anyhow::Result;

use crate::config::{MementoConfig, NamespacePolicy, UrlScheme};
use crate::db::Database;
use crate::models::{Memento, OriginalResource, Page, RevisionTimeline, Title};

/// Source of revision timelines.
///
/// Implementations apply every access policy themselves: the core trusts
/// that whatever comes back may be shown to the requester.
pub trait RevisionStore {
    /// Resolve a title to its page, or `None` if it is unknown or excluded.
    fn resolve(&self, title: &Title) -> Result<Option<Page>>;

    /// The ordered history of a page, or `None` if the page is gone.
    fn fetch_timeline(&self, page: &Page) -> Result<Option<RevisionTimeline>>;
}

/// [`RevisionStore`] over the SQLite wiki store.
#[derive(Clone)]
pub struct WikiRevisionStore {
    db: Database,
    urls: UrlScheme,
    namespaces: NamespacePolicy,
}

impl WikiRevisionStore {
    pub fn new(db: Database, urls: UrlScheme, namespaces: NamespacePolicy) -> Self {
        Self {
            db,
            urls,
            namespaces,
        }
    }

    pub fn from_config(db: Database, config: &MementoConfig) -> Self {
        Self::new(db, config.urls.clone(), config.namespaces.clone())
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn urls(&self) -> &UrlScheme {
        &self.urls
    }

    /// Whether `title` takes part in Memento negotiation at all.
    pub fn is_included(&self, title: &Title) -> bool {
        self.namespaces.allows(title)
    }

    pub fn original_resource(&self, title: &Title) -> OriginalResource {
        self.urls.original(title)
    }

    /// Resolve and fetch in one go, as every endpoint needs both.
    pub fn lookup(&self, title: &Title) -> Result<Option<(Page, RevisionTimeline)>> {
        let Some(page) = self.resolve(title)? else {
            return Ok(None);
        };
        Ok(self.fetch_timeline(&page)?.map(|timeline| (page, timeline)))
    }
}

impl RevisionStore for WikiRevisionStore {
    fn resolve(&self, title: &Title) -> Result<Option<Page>> {
        if !self.is_included(title) {
            tracing::debug!("Namespace {} is excluded from Memento", title.namespace_label());
            return Ok(None);
        }
        self.db.get_page_by_title(title)
    }

    fn fetch_timeline(&self, page: &Page) -> Result<Option<RevisionTimeline>> {
        if self.db.get_page(page.id)?.is_none() {
            return Ok(None);
        }

        let timeline = self
            .db
            .get_revisions(page.id)?
            .into_iter()
            .map(|revision| {
                Memento::new(
                    revision.id,
                    revision.timestamp,
                    self.urls.memento_uri(&page.title, revision.id),
                )
            })
            .collect();

        Ok(Some(timeline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreatePageInput;
    use chrono::{TimeZone, Utc};

    fn store() -> WikiRevisionStore {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        WikiRevisionStore::new(db, UrlScheme::new("http://w"), NamespacePolicy::main_only())
    }

    fn create(store: &WikiRevisionStore, title: &str) -> Page {
        store
            .database()
            .create_page(CreatePageInput {
                title: Title::parse(title).unwrap(),
                content: "text".to_string(),
                author: "alice".to_string(),
                comment: None,
                timestamp: Some(Utc.with_ymd_and_hms(2013, 6, 1, 0, 0, 0).unwrap()),
            })
            .unwrap()
            .0
    }

    #[test]
    fn timeline_uses_memento_uris() {
        let store = store();
        let page = create(&store, "Page");

        let (_, timeline) = store.lookup(&page.title).unwrap().unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(
            timeline.first().unwrap().uri,
            format!("http://w/wiki/Page?oldid={}", page.latest_revision_id)
        );
    }

    #[test]
    fn excluded_namespaces_do_not_resolve() {
        let store = store();
        let page = create(&store, "Talk:Page");

        assert!(store.resolve(&page.title).unwrap().is_none());
        assert!(store.lookup(&page.title).unwrap().is_none());
    }

    #[test]
    fn deleted_pages_have_no_timeline() {
        let store = store();
        let page = create(&store, "Page");
        store.database().delete_page(page.id).unwrap();

        assert!(store.fetch_timeline(&page).unwrap().is_none());
    }
}
