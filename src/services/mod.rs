pub mod task_registry;
pub mod fetch_service;
pub mod ingestor;
pub mod notification_service;
pub mod poll_scheduler;
pub mod subscription_service;
pub mod source_service;

pub use fetch_service::FetchService;
pub use ingestor::ArticleIngestor;
pub use notification_service::{MailRelayNotifier, NotificationSender};
pub use poll_scheduler::PollScheduler;
pub use source_service::SourceService;
pub use subscription_service::{SubscribeOutcome, SubscriptionManager, UnsubscribeOutcome};
pub use task_registry::TaskRegistry;
