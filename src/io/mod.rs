//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `ingest` - Detection frame stream reader (JSONL from file or stdin)
//! - `notify` - Notification channel, worker, and delivery sinks
//! - `count_log` - Crossing ledger CSV export

pub mod count_log;
pub mod ingest;
pub mod notify;

// Re-export commonly used types
pub use count_log::CountLogWriter;
pub use ingest::run_ingest;
pub use notify::{
    create_notify_channel, LogSink, Notification, NotificationSink, Notifier, NotifySender,
    WebhookSink,
};
