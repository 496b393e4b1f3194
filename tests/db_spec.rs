use chrono::{DateTime, TimeZone, Utc};
use memento::db::Database;
use memento::models::*;
use speculate2::speculate;

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, month, day, 0, 0, 0).unwrap()
}

fn page_input(title: &str, timestamp: DateTime<Utc>) -> CreatePageInput {
    CreatePageInput {
        title: Title::parse(title).expect("valid title"),
        content: "first".to_string(),
        author: "alice".to_string(),
        comment: Some("created".to_string()),
        timestamp: Some(timestamp),
    }
}

fn revision_input(content: &str, timestamp: Option<DateTime<Utc>>) -> CreateRevisionInput {
    CreateRevisionInput {
        content: content.to_string(),
        author: "bob".to_string(),
        comment: None,
        timestamp,
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "pages" {
        describe "create_page" {
            it "creates the page with its first revision" {
                let (page, revision) = db.create_page(page_input("main page", at(6, 1)))
                    .expect("Failed to create page");

                assert_eq!(page.title.key(), "Main_page");
                assert_eq!(page.latest_revision_id, revision.id);
                assert_eq!(revision.page_id, page.id);
                assert_eq!(revision.timestamp, at(6, 1));
                assert_eq!(revision.comment, Some("created".to_string()));
            }

            it "rejects a duplicate title" {
                db.create_page(page_input("Page", at(6, 1))).expect("Failed to create");
                let err = db.create_page(page_input("page", at(7, 1))).unwrap_err();
                assert!(err.to_string().contains("already exists"));
            }

            it "truncates timestamps to whole seconds" {
                let precise = at(6, 1) + chrono::Duration::milliseconds(250);
                let (_, revision) = db.create_page(page_input("Page", precise)).expect("Failed to create");
                assert_eq!(revision.timestamp, at(6, 1));

                let stored = db.get_revision(revision.id).expect("Query failed").unwrap();
                assert_eq!(stored.timestamp, at(6, 1));
            }
        }

        describe "get_page_by_title" {
            it "returns None for an unknown title" {
                let title = Title::parse("Nowhere").unwrap();
                assert!(db.get_page_by_title(&title).expect("Query failed").is_none());
            }

            it "finds a page by its normalized title" {
                db.create_page(page_input("Talk:Main page", at(6, 1))).expect("Failed to create");

                let title = Title::parse("talk:main_page").unwrap();
                let page = db.get_page_by_title(&title).expect("Query failed").unwrap();
                assert_eq!(page.title.namespace(), "Talk");
            }
        }

        describe "get_all_pages" {
            it "returns pages ordered by title" {
                db.create_page(page_input("Zebra", at(6, 1))).expect("Failed to create");
                db.create_page(page_input("Alpha", at(6, 1))).expect("Failed to create");

                let titles: Vec<String> = db.get_all_pages().expect("Query failed")
                    .into_iter()
                    .map(|p| p.title.key())
                    .collect();
                assert_eq!(titles, vec!["Alpha", "Zebra"]);
            }
        }

        describe "delete_page" {
            it "removes the page and its revisions" {
                let (page, revision) = db.create_page(page_input("Page", at(6, 1))).expect("Failed to create");

                assert!(db.delete_page(page.id).expect("Delete failed"));
                assert!(db.get_page(page.id).expect("Query failed").is_none());
                assert!(db.get_revision(revision.id).expect("Query failed").is_none());
                assert!(!db.delete_page(page.id).expect("Delete failed"));
            }
        }
    }

    describe "revisions" {
        describe "add_revision" {
            it "appends and becomes the latest revision" {
                let (page, _) = db.create_page(page_input("Page", at(6, 1))).expect("Failed to create");

                let revision = db.add_revision(page.id, revision_input("second", Some(at(8, 1))))
                    .expect("Failed to add")
                    .expect("Page should exist");

                let page = db.get_page(page.id).expect("Query failed").unwrap();
                assert_eq!(page.latest_revision_id, revision.id);
                assert_eq!(revision.content, "second");
            }

            it "defaults the timestamp to now" {
                let (page, _) = db.create_page(page_input("Page", at(6, 1))).expect("Failed to create");
                let before = Utc::now() - chrono::Duration::seconds(1);

                let revision = db.add_revision(page.id, revision_input("now", None))
                    .expect("Failed to add")
                    .unwrap();
                assert!(revision.timestamp >= before);
            }

            it "returns None for an unknown page" {
                let result = db.add_revision(9999, revision_input("orphan", None)).expect("Query failed");
                assert!(result.is_none());
            }

            it "rejects a timestamp before the latest revision" {
                let (page, _) = db.create_page(page_input("Page", at(8, 1))).expect("Failed to create");

                let err = db.add_revision(page.id, revision_input("late", Some(at(6, 1)))).unwrap_err();
                assert!(err.to_string().contains("must not precede"));
            }
        }

        describe "get_revisions" {
            it "returns revisions oldest first with ties in insertion order" {
                let (page, first) = db.create_page(page_input("Page", at(6, 1))).expect("Failed to create");
                let a = db.add_revision(page.id, revision_input("a", Some(at(8, 1)))).unwrap().unwrap();
                let b = db.add_revision(page.id, revision_input("b", Some(at(8, 1)))).unwrap().unwrap();
                let c = db.add_revision(page.id, revision_input("c", Some(at(10, 1)))).unwrap().unwrap();

                let ids: Vec<i64> = db.get_revisions(page.id).expect("Query failed")
                    .iter()
                    .map(|r| r.id)
                    .collect();
                assert_eq!(ids, vec![first.id, a.id, b.id, c.id]);
            }

            it "is empty for an unknown page" {
                assert!(db.get_revisions(9999).expect("Query failed").is_empty());
            }
        }

        describe "get_page_history" {
            it "bundles the page with its revisions" {
                let (page, _) = db.create_page(page_input("Page", at(6, 1))).expect("Failed to create");
                db.add_revision(page.id, revision_input("second", Some(at(8, 1)))).unwrap();

                let history = db.get_page_history(&page.title).expect("Query failed").unwrap();
                assert_eq!(history.page.id, page.id);
                assert_eq!(history.revisions.len(), 2);
            }
        }
    }

    describe "persistence" {
        it "survives reopening an on-disk database" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("memento.db");

            {
                let disk = Database::open(path.clone()).expect("Failed to open");
                disk.migrate().expect("Failed to migrate");
                disk.create_page(page_input("Page", at(6, 1))).expect("Failed to create");
            }

            let disk = Database::open(path).expect("Failed to reopen");
            disk.migrate().expect("Failed to migrate");
            let pages = disk.get_all_pages().expect("Query failed");
            assert_eq!(pages.len(), 1);
            assert_eq!(pages[0].created_at, at(6, 1));
        }
    }
}
