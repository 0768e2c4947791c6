//! Spot/perp spread detection.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::Symbol;
use super::money::{pct_to_rate, spread_pct, Pct, Price, Usd};
use super::opportunity::Opportunity;

/// How many recent opportunities `summary()` lists.
const RECENT_OPPORTUNITIES: usize = 5;

/// Parameters for the opportunity detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Minimum spread above fees, in percent.
    pub min_spread_pct: Pct,
    /// Combined taker fee of both venues, in percent.
    pub total_fee_pct: Pct,
    /// Notional per trade in dollars.
    pub trade_size: Usd,
    /// Rolling history capacity.
    pub history_capacity: usize,
}

impl DetectorConfig {
    /// Spread the market must strictly exceed to produce an opportunity.
    #[must_use]
    pub fn required_spread_pct(&self) -> Pct {
        self.min_spread_pct + self.total_fee_pct
    }
}

/// Aggregate view over the rolling opportunity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySummary {
    pub total_opportunities: u64,
    pub potential_profits: Usd,
    pub average_spread_pct: Pct,
    pub best_opportunity: Option<Opportunity>,
    pub recent_opportunities: Vec<Opportunity>,
}

/// Detects spread opportunities and keeps a bounded observational history.
#[derive(Debug)]
pub struct OpportunityDetector {
    config: DetectorConfig,
    history: VecDeque<Opportunity>,
    total_detected: u64,
}

impl OpportunityDetector {
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            total_detected: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Check two prices for an opportunity. Records any hit in the history.
    pub fn check(
        &mut self,
        spot_symbol: &Symbol,
        perp_symbol: &Symbol,
        spot_price: Price,
        perp_price: Price,
        now: DateTime<Utc>,
    ) -> Option<Opportunity> {
        let opportunity = evaluate(&self.config, spot_symbol, perp_symbol, spot_price, perp_price, now)?;
        self.remember(opportunity.clone());
        Some(opportunity)
    }

    fn remember(&mut self, opportunity: Opportunity) {
        self.total_detected += 1;
        if self.config.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(opportunity);
    }

    /// Opportunities currently held in the history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Opportunity> {
        self.history.iter()
    }

    #[must_use]
    pub fn total_detected(&self) -> u64 {
        self.total_detected
    }

    #[must_use]
    pub fn summary(&self) -> OpportunitySummary {
        let count = self.history.len();
        let potential_profits: Usd = self.history.iter().map(Opportunity::expected_profit).sum();
        let average_spread_pct = if count == 0 {
            Decimal::ZERO
        } else {
            self.history.iter().map(Opportunity::spread_pct).sum::<Decimal>() / Decimal::from(count)
        };
        let best_opportunity = self
            .history
            .iter()
            .max_by(|a, b| a.expected_profit().cmp(&b.expected_profit()))
            .cloned();
        let recent_opportunities = self
            .history
            .iter()
            .skip(count.saturating_sub(RECENT_OPPORTUNITIES))
            .cloned()
            .collect();

        OpportunitySummary {
            total_opportunities: self.total_detected,
            potential_profits,
            average_spread_pct,
            best_opportunity,
            recent_opportunities,
        }
    }
}

/// Pure detection rule: spread must strictly exceed `min_spread + fees`
/// and the post-fee expected profit must be strictly positive.
#[must_use]
pub fn evaluate(
    config: &DetectorConfig,
    spot_symbol: &Symbol,
    perp_symbol: &Symbol,
    spot_price: Price,
    perp_price: Price,
    now: DateTime<Utc>,
) -> Option<Opportunity> {
    let spread = spread_pct(spot_price, perp_price)?;

    if spread <= config.required_spread_pct() {
        return None;
    }

    let expected_profit = pct_to_rate(spread - config.total_fee_pct) * config.trade_size;
    if expected_profit <= Decimal::ZERO {
        return None;
    }

    Some(Opportunity::new(
        spot_symbol.clone(),
        perp_symbol.clone(),
        spot_price,
        perp_price,
        spread,
        expected_profit,
        config.trade_size,
        now,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_config() -> DetectorConfig {
        DetectorConfig {
            min_spread_pct: dec!(0.05),
            total_fee_pct: dec!(0.15),
            trade_size: dec!(1000),
            history_capacity: 3,
        }
    }

    fn check(detector: &mut OpportunityDetector, spot: Decimal, perp: Decimal) -> Option<Opportunity> {
        detector.check(
            &Symbol::from("SOLUSDT"),
            &Symbol::from("SOLPERP"),
            spot,
            perp,
            Utc::now(),
        )
    }

    #[test]
    fn test_detects_spread_above_threshold() {
        let mut detector = OpportunityDetector::new(make_config());

        let opp = check(&mut detector, dec!(100.00), dec!(100.50)).unwrap();
        assert_eq!(opp.spread_pct(), dec!(0.5));
        assert_eq!(opp.expected_profit(), dec!(3.50));
        assert_eq!(opp.trade_size(), dec!(1000));
    }

    #[test]
    fn test_no_opportunity_at_exact_threshold() {
        let mut detector = OpportunityDetector::new(make_config());

        // 0.2% == 0.05 + 0.15, must be strictly above
        assert!(check(&mut detector, dec!(100), dec!(100.2)).is_none());
        assert!(check(&mut detector, dec!(100), dec!(100.21)).is_some());
    }

    #[test]
    fn test_no_opportunity_for_negative_spread() {
        let mut detector = OpportunityDetector::new(make_config());
        assert!(check(&mut detector, dec!(100), dec!(99)).is_none());
    }

    #[test]
    fn test_no_opportunity_when_profit_not_positive() {
        // Negative min spread lets the spread clear the threshold while still
        // sitting below the fee, so profit would be negative.
        let mut detector = OpportunityDetector::new(DetectorConfig {
            min_spread_pct: dec!(-0.1),
            ..make_config()
        });
        assert!(check(&mut detector, dec!(100), dec!(100.1)).is_none());
    }

    #[test]
    fn test_zero_spot_price_is_ignored() {
        let mut detector = OpportunityDetector::new(make_config());
        assert!(check(&mut detector, Decimal::ZERO, dec!(1)).is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut detector = OpportunityDetector::new(make_config());
        for perp in [dec!(100.3), dec!(100.4), dec!(100.5), dec!(100.6)] {
            check(&mut detector, dec!(100), perp);
        }

        assert_eq!(detector.history().count(), 3);
        assert_eq!(detector.total_detected(), 4);
        assert_eq!(detector.history().next().unwrap().spread_pct(), dec!(0.4));
    }

    #[test]
    fn test_summary() {
        let mut detector = OpportunityDetector::new(make_config());
        check(&mut detector, dec!(100), dec!(100.3));
        check(&mut detector, dec!(100), dec!(100.5));

        let summary = detector.summary();
        assert_eq!(summary.total_opportunities, 2);
        assert_eq!(summary.average_spread_pct, dec!(0.4));
        assert_eq!(summary.potential_profits, dec!(5.00));
        assert_eq!(summary.best_opportunity.unwrap().spread_pct(), dec!(0.5));
        assert_eq!(summary.recent_opportunities.len(), 2);
    }

    #[test]
    fn test_empty_summary() {
        let detector = OpportunityDetector::new(make_config());
        let summary = detector.summary();
        assert_eq!(summary.total_opportunities, 0);
        assert_eq!(summary.average_spread_pct, Decimal::ZERO);
        assert!(summary.best_opportunity.is_none());
    }
}
