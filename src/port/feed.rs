//! Price feed port.

use async_trait::async_trait;

use crate::domain::{PriceQuote, Symbol};
use crate::error::Result;

/// Source of last-traded prices.
///
/// Implementations map transport and decoding failures to
/// [`Error::FeedUnavailable`](crate::error::Error::FeedUnavailable) so the
/// monitor loop can retry them.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Short identifier for logging.
    fn name(&self) -> &'static str;

    /// Fetch the current price of `symbol`.
    async fn get_price(&self, symbol: &Symbol) -> Result<PriceQuote>;
}
