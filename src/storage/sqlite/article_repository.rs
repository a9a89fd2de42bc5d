use rusqlite::{params, Row};

use crate::domain::Article;
use crate::errors::{NewsError, NewsResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ArticleStore;

const ARTICLE_COLUMNS: &str =
    "id, title, description, content, link, published_at, author, source_id";

pub struct SqliteArticleRepository {
    storage: SqliteStorage,
}

impl SqliteArticleRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        content: row.get(3)?,
        link: row.get(4)?,
        published_at: row.get(5)?,
        author: row.get(6)?,
        source_id: row.get(7)?,
    })
}

impl ArticleStore for SqliteArticleRepository {
    fn find_by_id(&self, id: &str) -> NewsResult<Option<Article>> {
        let conn = self.storage.connection()?;
        let article = conn.query_row(
            &format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS),
            [id],
            article_from_row,
        );

        match article {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(NewsError::from(e)),
        }
    }

    fn create(&self, article: &Article) -> NewsResult<Article> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO articles (id, title, description, content, link, published_at, author, source_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                article.id,
                article.title,
                article.description,
                article.content,
                article.link,
                article.published_at,
                article.author,
                article.source_id,
            ],
        )?;
        Ok(article.clone())
    }

    fn list_by_source(&self, source_id: i64) -> NewsResult<Vec<Article>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM articles WHERE source_id = ?1 ORDER BY published_at DESC",
            ARTICLE_COLUMNS
        ))?;

        let articles = stmt.query_map([source_id], article_from_row)?;
        articles.collect::<Result<Vec<_>, _>>().map_err(NewsError::from)
    }

    fn count_by_source(&self, source_id: i64) -> NewsResult<usize> {
        let conn = self.storage.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE source_id = ?1",
            [source_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
