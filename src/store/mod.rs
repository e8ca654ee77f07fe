pub mod sqlite;

use crate::app::Result;
use crate::domain::{Article, Source};

pub use sqlite::SqliteStore;

/// Persistence collaborator.
///
/// `get_or_create_*` must be atomic: two overlapping polls that discover the
/// same entry end up sharing one record.
pub trait Store {
    // Source operations
    fn get_or_create_source(&self, url: &str) -> Result<(Source, bool)>;
    fn get_source(&self, url: &str) -> Result<Option<Source>>;
    fn all_sources(&self) -> Result<Vec<Source>>;
    fn put_source(&self, source: &Source) -> Result<()>;

    // Article operations
    fn get_or_create_articles(&self, ids: &[String]) -> Result<Vec<(Article, bool)>>;
    fn get_article(&self, id: &str) -> Result<Option<Article>>;
    fn put_article(&self, article: &Article) -> Result<()>;
    fn put_articles(&self, articles: &[Article]) -> Result<()>;
    fn articles_for_source(&self, source_url: &str, limit: usize) -> Result<Vec<Article>>;
}
