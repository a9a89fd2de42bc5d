pub mod traits;
pub mod sqlite;

pub use traits::{ArticleStore, SourceStore, UserDirectory};
pub use sqlite::{SqliteArticleRepository, SqliteSourceRepository, SqliteStorage, SqliteUserRepository};
