use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsfetch")]
#[command(about = "Feed ingestion with per-source polling and email digests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a user who can own sources
    AddUser {
        /// Address digests and confirmations are sent to
        email: String,
    },

    /// Add a feed source (fetched once before it is saved)
    Add {
        /// Owning user id
        #[arg(long)]
        user: i64,

        /// Display name (defaults to the feed title)
        #[arg(long, default_value = "")]
        name: String,

        /// RSS or Atom feed URL
        #[arg(long)]
        url: String,

        /// Poll interval in minutes
        #[arg(long, default_value_t = crate::domain::DEFAULT_POLL_INTERVAL_MINUTES)]
        interval: u32,
    },

    /// Change name, URL or poll interval of a source
    Update {
        /// Source id
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// Poll interval in minutes
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Remove a source and its articles
    Remove {
        /// Source id
        id: i64,
    },

    /// List sources
    List {
        /// Only sources owned by this user
        #[arg(long)]
        user: Option<i64>,
    },

    /// List stored articles of a source, newest first
    Articles {
        /// Source id
        source_id: i64,
    },

    /// Show the current feed of a source
    Feed {
        /// Source id
        source_id: i64,

        /// Print the feed as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enable the daily email digest for a source
    Subscribe {
        /// Source id
        source_id: i64,
    },

    /// Disable the daily email digest for a source
    Unsubscribe {
        /// Source id
        source_id: i64,
    },

    /// Poll every source and send digests until interrupted
    Run,
}
