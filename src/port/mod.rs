//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! - [`PriceFeed`] - spot and perpetual price sources
//! - [`LedgerStore`], [`MetricsStore`] - snapshot persistence
//! - [`Notifier`] - fire-and-forget event delivery

mod feed;
mod notifier;
mod store;

pub use feed::PriceFeed;
pub use notifier::{
    CooldownEvent, Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier,
    OpportunityEvent, RejectionEvent, TradeClosedEvent, TradeOpenedEvent,
};
pub use store::{LedgerStore, MetricsStore, NullStore};
