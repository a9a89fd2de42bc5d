mod connection;
mod source_repository;
mod article_repository;
mod user_repository;

pub use connection::SqliteStorage;
pub use source_repository::SqliteSourceRepository;
pub use article_repository::SqliteArticleRepository;
pub use user_repository::SqliteUserRepository;
