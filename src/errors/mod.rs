use thiserror::Error;

/// Why a feed could not be turned into a `Feed`.
#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    Status(u16),

    #[error("document too large: {0} bytes")]
    TooLarge(u64),

    #[error("malformed document: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum NewsError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Source errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Source already exists for user {user_id}: {url}")]
    DuplicateSource { user_id: i64, url: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // Network and parsing errors
    #[error("Failed to fetch feed {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchFailure,
    },

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // Notification errors
    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Mail relay error: {0}")]
    MailRelay(#[from] mailrelay::MailError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl NewsError {
    pub fn fetch(url: &str, source: impl Into<FetchFailure>) -> Self {
        NewsError::Fetch {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        NewsError::NotFound(format!("{} {}", what, id))
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, NewsError::Fetch { .. })
    }
}

pub type NewsResult<T> = Result<T, NewsError>;
