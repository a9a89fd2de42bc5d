use chrono::Utc;
use rusqlite::{params, Row};

use crate::domain::{NewSource, Source, SourceUpdate};
use crate::errors::{NewsError, NewsResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::SourceStore;

const SOURCE_COLUMNS: &str =
    "id, name, url, user_id, poll_interval_minutes, subscribed, created_at";

pub struct SqliteSourceRepository {
    storage: SqliteStorage,
}

impl SqliteSourceRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn query(&self, filter: &str, params: impl rusqlite::Params) -> NewsResult<Vec<Source>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sources {} ORDER BY id",
            SOURCE_COLUMNS, filter
        ))?;

        let sources = stmt.query_map(params, source_from_row)?;
        sources.collect::<Result<Vec<_>, _>>().map_err(NewsError::from)
    }
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        user_id: row.get(3)?,
        poll_interval_minutes: row.get(4)?,
        subscribed: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl SourceStore for SqliteSourceRepository {
    fn find_one(&self, id: i64) -> NewsResult<Source> {
        let conn = self.storage.connection()?;
        let source = conn.query_row(
            &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
            [id],
            source_from_row,
        );

        match source {
            Ok(s) => Ok(s),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(NewsError::not_found("source", id)),
            Err(e) => Err(NewsError::from(e)),
        }
    }

    fn find_all(&self) -> NewsResult<Vec<Source>> {
        self.query("", [])
    }

    fn find_by_user(&self, user_id: i64) -> NewsResult<Vec<Source>> {
        self.query("WHERE user_id = ?1", [user_id])
    }

    fn find_all_with_subscription_enabled(&self) -> NewsResult<Vec<Source>> {
        self.query("WHERE subscribed = 1", [])
    }

    fn create(&self, source: &NewSource) -> NewsResult<Source> {
        let conn = self.storage.connection()?;

        // Check within the same connection to avoid deadlock
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sources WHERE user_id = ?1 AND url = ?2)",
            params![source.user_id, source.url],
            |row| row.get(0),
        )?;

        if exists {
            return Err(NewsError::DuplicateSource {
                user_id: source.user_id,
                url: source.url.clone(),
            });
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO sources (name, url, user_id, poll_interval_minutes, subscribed, created_at) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                source.name,
                source.url,
                source.user_id,
                source.poll_interval_minutes,
                created_at,
            ],
        )?;

        Ok(Source {
            id: conn.last_insert_rowid(),
            name: source.name.clone(),
            url: source.url.clone(),
            user_id: source.user_id,
            poll_interval_minutes: source.poll_interval_minutes,
            subscribed: false,
            created_at,
        })
    }

    fn update(&self, id: i64, update: &SourceUpdate) -> NewsResult<Source> {
        {
            let conn = self.storage.connection()?;
            let changed = conn.execute(
                "UPDATE sources SET
                    name = COALESCE(?2, name),
                    url = COALESCE(?3, url),
                    poll_interval_minutes = COALESCE(?4, poll_interval_minutes),
                    subscribed = COALESCE(?5, subscribed)
                 WHERE id = ?1",
                params![
                    id,
                    update.name,
                    update.url,
                    update.poll_interval_minutes,
                    update.subscribed,
                ],
            )?;

            if changed == 0 {
                return Err(NewsError::not_found("source", id));
            }
        }

        self.find_one(id)
    }

    fn delete(&self, id: i64) -> NewsResult<()> {
        let conn = self.storage.connection()?;
        let changed = conn.execute("DELETE FROM sources WHERE id = ?1", [id])?;

        if changed == 0 {
            return Err(NewsError::not_found("source", id));
        }
        Ok(())
    }
}
