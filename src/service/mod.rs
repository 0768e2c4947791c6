//! Stateful services fed by the orchestrator.

mod performance;
mod risk;

pub use performance::{
    recommendations, MetricsSnapshot, PerformanceMetrics, PerformanceTracker, PeriodicSnapshot,
    ProfitabilityReport, Recommendation, ReportSummary, BALANCE_HISTORY_CAPACITY,
    METRICS_SCHEMA_VERSION, SNAPSHOT_CAPACITY,
};
pub use risk::{RiskCheck, RiskGovernor, RiskLevel, RiskLimits, RiskState, RiskStatus};
