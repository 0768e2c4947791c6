//! Notification adapters.

mod webhook;

pub use webhook::{WebhookConfig, WebhookNotifier};
