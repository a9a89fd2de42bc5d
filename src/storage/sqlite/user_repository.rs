use crate::errors::{NewsError, NewsResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::UserDirectory;

pub struct SqliteUserRepository {
    storage: SqliteStorage,
}

impl SqliteUserRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl UserDirectory for SqliteUserRepository {
    fn find_owner_email(&self, user_id: i64) -> NewsResult<String> {
        let conn = self.storage.connection()?;
        let email = conn.query_row("SELECT email FROM users WHERE id = ?1", [user_id], |row| {
            row.get(0)
        });

        match email {
            Ok(email) => Ok(email),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(NewsError::not_found("user", user_id)),
            Err(e) => Err(NewsError::from(e)),
        }
    }

    fn create(&self, email: &str) -> NewsResult<i64> {
        let conn = self.storage.connection()?;
        conn.execute("INSERT INTO users (email) VALUES (?1)", [email])?;
        Ok(conn.last_insert_rowid())
    }
}
