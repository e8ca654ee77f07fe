use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use serde::de::DeserializeOwned;

use crate::app::{Result, TributaryError};
use crate::domain::{Article, ArticleState, Source};
use crate::store::Store;

const SOURCE_COLUMNS: &str = "url, title, brand, featured_priority, categories, last_fetched,
     most_recent_article_added_date, shared_title_suffix, fetch_url_override";

const ARTICLE_COLUMNS: &str = "id, state, source_url, url, submission_url, title, published,
     added_date, added_order, fetch_date, parsed";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| TributaryError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            TributaryError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
        Ok(row
            .get::<_, Option<String>>(idx)?
            .and_then(|s| Self::parse_datetime(&s)))
    }

    fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
        match row.get::<_, Option<String>>(idx)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
            None => Ok(None),
        }
    }

    fn source_from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
        Ok(Source {
            url: row.get(0)?,
            title: row.get(1)?,
            brand: Self::json_column(row, 2)?,
            featured_priority: row.get(3)?,
            categories: Self::json_column(row, 4)?.unwrap_or_default(),
            last_fetched: Self::datetime_column(row, 5)?,
            most_recent_article_added_date: Self::datetime_column(row, 6)?,
            shared_title_suffix: row.get(7)?,
            fetch_url_override: row.get(8)?,
        })
    }

    fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
        Ok(Article {
            id: row.get(0)?,
            state: ArticleState::parse(&row.get::<_, String>(1)?),
            source_url: row.get(2)?,
            url: row.get(3)?,
            submission_url: row.get(4)?,
            title: row.get(5)?,
            published: Self::datetime_column(row, 6)?,
            added_date: Self::datetime_column(row, 7)?,
            added_order: row.get(8)?,
            fetch_date: Self::datetime_column(row, 9)?,
            parsed: Self::json_column(row, 10)?,
        })
    }

    fn write_article(conn: &Connection, article: &Article) -> Result<()> {
        let parsed = article
            .parsed
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO articles ({ARTICLE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                article.id,
                article.state.as_str(),
                article.source_url,
                article.url,
                article.submission_url,
                article.title,
                article.published.map(|dt| dt.to_rfc3339()),
                article.added_date.map(|dt| dt.to_rfc3339()),
                article.added_order,
                article.fetch_date.map(|dt| dt.to_rfc3339()),
                parsed,
            ],
        )?;

        Ok(())
    }
}

impl Store for SqliteStore {
    fn get_or_create_source(&self, url: &str) -> Result<(Source, bool)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let created = tx.execute(
            "INSERT OR IGNORE INTO sources (url) VALUES (?1)",
            params![url],
        )? > 0;

        let source = tx.query_row(
            &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE url = ?1"),
            params![url],
            Self::source_from_row,
        )?;

        tx.commit()?;
        Ok((source, created))
    }

    fn get_source(&self, url: &str) -> Result<Option<Source>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE url = ?1"),
                params![url],
                Self::source_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn all_sources(&self) -> Result<Vec<Source>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources
             ORDER BY most_recent_article_added_date DESC, url"
        ))?;

        let sources = stmt
            .query_map([], Self::source_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    fn put_source(&self, source: &Source) -> Result<()> {
        let conn = self.lock()?;

        let brand = source.brand.as_ref().map(serde_json::to_string).transpose()?;
        let categories = serde_json::to_string(&source.categories)?;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO sources ({SOURCE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                source.url,
                source.title,
                brand,
                source.featured_priority,
                categories,
                source.last_fetched.map(|dt| dt.to_rfc3339()),
                source.most_recent_article_added_date.map(|dt| dt.to_rfc3339()),
                source.shared_title_suffix,
                source.fetch_url_override,
            ],
        )?;

        Ok(())
    }

    fn get_or_create_articles(&self, ids: &[String]) -> Result<Vec<(Article, bool)>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut records = Vec::with_capacity(ids.len());

        for id in ids {
            let created = tx.execute(
                "INSERT OR IGNORE INTO articles (id) VALUES (?1)",
                params![id],
            )? > 0;

            let article = tx.query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id],
                Self::article_from_row,
            )?;

            records.push((article, created));
        }

        tx.commit()?;
        Ok(records)
    }

    fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id],
                Self::article_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn put_article(&self, article: &Article) -> Result<()> {
        let conn = self.lock()?;
        Self::write_article(&conn, article)
    }

    fn put_articles(&self, articles: &[Article]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for article in articles {
            Self::write_article(&tx, article)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn articles_for_source(&self, source_url: &str, limit: usize) -> Result<Vec<Article>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE source_url = ?1 AND state != 'created'
             ORDER BY added_date DESC, added_order ASC
             LIMIT ?2"
        ))?;

        let articles = stmt
            .query_map(params![source_url, limit as i64], Self::article_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }
}
