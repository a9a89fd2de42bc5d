use std::sync::Arc;

use clap::Parser;
use tracing::info;

use newsfetch::cli::{Cli, Commands};
use newsfetch::config::Config;
use newsfetch::domain::{NewSource, SourceUpdate};
use newsfetch::errors::{NewsError, NewsResult};
use newsfetch::logging;
use newsfetch::parser::HttpFeedParser;
use newsfetch::services::{
    MailRelayNotifier, SourceService, SubscribeOutcome, UnsubscribeOutcome,
};
use newsfetch::storage::SqliteStorage;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> NewsResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    logging::init(&config.log_level);

    // Wire storage, parser and mail relay
    let storage = SqliteStorage::new(&config.db_path)?;
    let parser = Arc::new(HttpFeedParser::new(config.fetch_timeout)?);
    let notifier = Arc::new(MailRelayNotifier::new(&config)?);
    let service = SourceService::with_storage(storage, parser, notifier, &config);

    let result = match cli.command {
        Commands::AddUser { email } => cmd_add_user(&service, &email),
        Commands::Add {
            user,
            name,
            url,
            interval,
        } => cmd_add(&service, user, name, url, interval).await,
        Commands::Update {
            id,
            name,
            url,
            interval,
        } => cmd_update(&service, id, name, url, interval).await,
        Commands::Remove { id } => cmd_remove(&service, id).await,
        Commands::List { user } => cmd_list(&service, user),
        Commands::Articles { source_id } => cmd_articles(&service, source_id),
        Commands::Feed { source_id, json } => cmd_feed(&service, source_id, json).await,
        Commands::Subscribe { source_id } => cmd_subscribe(&service, source_id),
        Commands::Unsubscribe { source_id } => cmd_unsubscribe(&service, source_id).await,
        Commands::Run => cmd_run(&service).await,
    };

    service.shutdown().await;
    result
}

fn cmd_add_user(service: &SourceService, email: &str) -> NewsResult<()> {
    let id = service.add_user(email)?;
    println!("User {} created with id {}", email.trim(), id);
    Ok(())
}

async fn cmd_add(
    service: &SourceService,
    user: i64,
    name: String,
    url: String,
    interval: u32,
) -> NewsResult<()> {
    if interval == 0 {
        return Err(NewsError::InvalidInput(
            "interval must be at least one minute".to_string(),
        ));
    }

    println!("Validating feed: {}", url);

    let source = service
        .create_source(NewSource::new(name, url, user).with_poll_interval(interval))
        .await?;

    println!("Source added successfully!");
    println!("  Id: {}", source.id);
    println!("  Name: {}", source.name);
    println!("  Interval: {} min", source.poll_interval_minutes);
    Ok(())
}

async fn cmd_update(
    service: &SourceService,
    id: i64,
    name: Option<String>,
    url: Option<String>,
    interval: Option<u32>,
) -> NewsResult<()> {
    if interval == Some(0) {
        return Err(NewsError::InvalidInput(
            "interval must be at least one minute".to_string(),
        ));
    }

    let update = SourceUpdate {
        name,
        url,
        poll_interval_minutes: interval,
        subscribed: None,
    };
    if update.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    let source = service.update_source(id, update).await?;
    println!("Updated: {} ({})", source.name, source.url);
    Ok(())
}

async fn cmd_remove(service: &SourceService, id: i64) -> NewsResult<()> {
    let source = service.find_source(id)?;
    service.delete_source(id).await?;
    println!("Removed: {}", source.name);
    Ok(())
}

fn cmd_list(service: &SourceService, user: Option<i64>) -> NewsResult<()> {
    let sources = service.list_sources(user)?;

    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("Configured sources:\n");
    for source in sources {
        let digest = if source.subscribed { ", digest on" } else { "" };
        println!("  {}. {} [user {}{}]", source.id, source.name, source.user_id, digest);
        println!("    URL: {}", source.url);
        println!("    Every {} min", source.poll_interval_minutes);
        println!();
    }

    Ok(())
}

fn cmd_articles(service: &SourceService, source_id: i64) -> NewsResult<()> {
    let articles = service.list_articles(source_id)?;

    if articles.is_empty() {
        println!("No articles stored for source {}.", source_id);
        return Ok(());
    }

    for article in articles {
        println!(
            "  {} {} ({})",
            article.published_at.format("%Y-%m-%d %H:%M"),
            article.title,
            article.author
        );
        println!("    {}", article.link);
    }

    Ok(())
}

async fn cmd_feed(service: &SourceService, source_id: i64, json: bool) -> NewsResult<()> {
    let feed = service.load_feed(source_id).await?;

    if json {
        let out = serde_json::to_string_pretty(feed.as_ref())
            .map_err(|e| NewsError::InvalidInput(format!("cannot encode feed: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    println!("{} ({} items):\n", feed.title, feed.items.len());
    for item in &feed.items {
        println!("  {} {}", item.published.format("%Y-%m-%d"), item.title);
        println!("    {}", item.link);
    }

    Ok(())
}

fn cmd_subscribe(service: &SourceService, source_id: i64) -> NewsResult<()> {
    match service.subscribe(source_id)? {
        SubscribeOutcome::Subscribed => println!("Subscribed to source {}.", source_id),
        SubscribeOutcome::Resumed => println!("Subscription for source {} resumed.", source_id),
        SubscribeOutcome::AlreadySubscribed => {
            println!("Source {} is already subscribed.", source_id)
        }
    }
    Ok(())
}

async fn cmd_unsubscribe(service: &SourceService, source_id: i64) -> NewsResult<()> {
    match service.unsubscribe(source_id).await? {
        UnsubscribeOutcome::Unsubscribed => println!("Unsubscribed from source {}.", source_id),
        UnsubscribeOutcome::AlreadyUnsubscribed => {
            println!("Source {} is already unsubscribed.", source_id)
        }
    }
    Ok(())
}

async fn cmd_run(service: &SourceService) -> NewsResult<()> {
    let subscriptions = service.initialize_subscriptions()?;
    let sources = service.list_sources(None)?;

    println!(
        "Polling {} sources, {} digests active. Press Ctrl-C to stop.",
        sources.len(),
        subscriptions
    );

    for source in &sources {
        if let Err(e) = service.load_feed(source.id).await {
            // Polling was started regardless; the next tick retries
            eprintln!("  ! {}: {}", source.name, e);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    println!("Stopping...");

    Ok(())
}
