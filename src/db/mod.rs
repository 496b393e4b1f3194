mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::*;

const PAGE_COLUMNS: &str = "id, title, latest_revision_id, created_at";
const REVISION_COLUMNS: &str = "id, page_id, content, comment, author, timestamp";

/// SQLite-backed wiki store: pages and their append-only revisions.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "memento")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("memento.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Page operations
    // ============================================================

    pub fn get_all_pages(&self) -> Result<Vec<Page>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages ORDER BY title",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    pub fn get_page(&self, id: i64) -> Result<Option<Page>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let page = conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS),
                [id],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    pub fn get_page_by_title(&self, title: &Title) -> Result<Option<Page>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let page = conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE title = ?", PAGE_COLUMNS),
                [title.key()],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Create a page together with its first revision.
    pub fn create_page(&self, input: CreatePageInput) -> Result<(Page, Revision)> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now().trunc_subsecs(0);
        let timestamp = input.timestamp.map(|t| t.trunc_subsecs(0)).unwrap_or(now);

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM pages WHERE title = ?)",
            [input.title.key()],
            |row| row.get(0),
        )?;
        if exists {
            anyhow::bail!("Page {} already exists", input.title);
        }

        tx.execute(
            "INSERT INTO pages (namespace, title, created_at) VALUES (?, ?, ?)",
            (
                input.title.namespace(),
                input.title.key(),
                format_timestamp(timestamp),
            ),
        )?;
        let page_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO revisions (page_id, content, comment, author, timestamp)
             VALUES (?, ?, ?, ?, ?)",
            (
                page_id,
                &input.content,
                &input.comment,
                &input.author,
                format_timestamp(timestamp),
            ),
        )?;
        let revision_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE pages SET latest_revision_id = ? WHERE id = ?",
            (revision_id, page_id),
        )?;
        tx.commit()?;

        tracing::debug!("Created page {} (revision {})", input.title, revision_id);

        Ok((
            Page {
                id: page_id,
                title: input.title,
                latest_revision_id: revision_id,
                created_at: timestamp,
            },
            Revision {
                id: revision_id,
                page_id,
                content: input.content,
                comment: input.comment,
                author: input.author,
                timestamp,
            },
        ))
    }

    pub fn delete_page(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM pages WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Revision operations
    // ============================================================

    /// Append a revision. Returns `None` if the page does not exist.
    ///
    /// Revisions are append-only and their timestamps non-decreasing, so a
    /// page's revision ids and timestamps always sort the same way.
    pub fn add_revision(&self, page_id: i64, input: CreateRevisionInput) -> Result<Option<Revision>> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let latest: Option<Option<String>> = tx
            .query_row(
                "SELECT r.timestamp FROM pages p
                 LEFT JOIN revisions r ON r.id = p.latest_revision_id
                 WHERE p.id = ?",
                [page_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(latest) = latest else {
            return Ok(None);
        };

        let timestamp = input
            .timestamp
            .unwrap_or_else(Utc::now)
            .trunc_subsecs(0);
        if let Some(latest) = latest.map(parse_timestamp) {
            if timestamp < latest {
                anyhow::bail!(
                    "Revision timestamp {} must not precede the latest revision ({})",
                    format_timestamp(timestamp),
                    format_timestamp(latest)
                );
            }
        }

        tx.execute(
            "INSERT INTO revisions (page_id, content, comment, author, timestamp)
             VALUES (?, ?, ?, ?, ?)",
            (
                page_id,
                &input.content,
                &input.comment,
                &input.author,
                format_timestamp(timestamp),
            ),
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE pages SET latest_revision_id = ? WHERE id = ?",
            (id, page_id),
        )?;
        tx.commit()?;

        Ok(Some(Revision {
            id,
            page_id,
            content: input.content,
            comment: input.comment,
            author: input.author,
            timestamp,
        }))
    }

    pub fn get_revision(&self, id: i64) -> Result<Option<Revision>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let revision = conn
            .query_row(
                &format!("SELECT {} FROM revisions WHERE id = ?", REVISION_COLUMNS),
                [id],
                revision_from_row,
            )
            .optional()?;
        Ok(revision)
    }

    /// All revisions of a page, oldest first; ties keep insertion order.
    pub fn get_revisions(&self, page_id: i64) -> Result<Vec<Revision>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM revisions WHERE page_id = ? ORDER BY timestamp, id",
            REVISION_COLUMNS
        ))?;

        let revisions = stmt
            .query_map([page_id], revision_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(revisions)
    }

    pub fn get_page_history(&self, title: &Title) -> Result<Option<PageHistory>> {
        let Some(page) = self.get_page_by_title(title)? else {
            return Ok(None);
        };
        let revisions = self.get_revisions(page.id)?;
        Ok(Some(PageHistory { page, revisions }))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    let title: String = row.get(1)?;
    Ok(Page {
        id: row.get(0)?,
        title: Title::parse(&title).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        latest_revision_id: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        created_at: parse_timestamp(row.get::<_, String>(3)?),
    })
}

fn revision_from_row(row: &Row<'_>) -> rusqlite::Result<Revision> {
    Ok(Revision {
        id: row.get(0)?,
        page_id: row.get(1)?,
        content: row.get(2)?,
        comment: row.get(3)?,
        author: row.get(4)?,
        timestamp: parse_timestamp(row.get::<_, String>(5)?),
    })
}

/// Second-precision RFC 3339 in UTC, so stored timestamps sort as text.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
