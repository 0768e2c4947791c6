//! Exchange-agnostic domain logic.

mod detector;
mod ids;
mod ledger;
mod money;
mod opportunity;
mod quote;
mod trade;

pub use detector::{evaluate, DetectorConfig, OpportunityDetector, OpportunitySummary};
pub use ids::{Symbol, TradeId};
pub use ledger::{
    ClosedTrade, ExitRules, ExitStrategy, LedgerConfig, LedgerSnapshot, LedgerSummary, OpenGate,
    TradeGate, TradeLedger, LEDGER_SCHEMA_VERSION,
};
pub use money::{pct_to_rate, spread_pct, Pct, Price, Usd};
pub use opportunity::Opportunity;
pub use quote::{PriceQuote, PriceTick, SymbolPair};
pub use trade::{ExitDecision, ExitReason, Trade, TradeClose, TradeStatus};
