//! Concrete implementations of the ports.

pub mod feed;
pub mod notifier;
pub mod store;
