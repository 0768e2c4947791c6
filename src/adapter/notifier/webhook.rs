//! Discord-style webhook notifier.
//!
//! Events are rendered into `{username, content, embeds}` payloads and posted
//! by a background worker, so `notify` never waits on the network.

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::port::{Event, Notifier};

const GREEN: u32 = 0x00ff00;
const RED: u32 = 0xff0000;
const ORANGE: u32 = 0xffa500;
const BLUE: u32 = 0x0099ff;

/// Configuration for the webhook notifier.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub username: String,
    /// Opportunity alerts are noisy and off unless asked for.
    pub notify_opportunities: bool,
    pub notify_trades: bool,
    pub notify_reports: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<EmbedField>,
    timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct WebhookPayload {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    embeds: Vec<Embed>,
}

/// Notifier that posts events to a webhook.
pub struct WebhookNotifier {
    sender: mpsc::UnboundedSender<Event>,
}

impl WebhookNotifier {
    /// Create the notifier and spawn its worker. Must be called inside a
    /// Tokio runtime.
    pub fn new(config: WebhookConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(webhook_worker(config, receiver));
        Self { sender }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: Event) {
        if self.sender.send(event).is_err() {
            warn!("Webhook notifier channel closed");
        }
    }
}

async fn webhook_worker(config: WebhookConfig, mut receiver: mpsc::UnboundedReceiver<Event>) {
    let client = Client::new();
    info!("Webhook notifier started");

    while let Some(event) = receiver.recv().await {
        let Some(payload) = render(&config, &event) else {
            continue;
        };

        match client.post(&config.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(status = %response.status(), "Webhook delivered");
            }
            Ok(response) => {
                error!(status = %response.status(), "Webhook rejected message");
            }
            Err(e) => {
                error!(error = %e, "Failed to send webhook message");
            }
        }
    }

    warn!("Webhook worker shutting down");
}

fn field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline: true,
    }
}

/// Render an event, or `None` when its toggle is off.
fn render(config: &WebhookConfig, event: &Event) -> Option<WebhookPayload> {
    let (title, description, color, fields) = match event {
        Event::OpportunityDetected(e) if config.notify_opportunities => (
            "Opportunity Detected".to_string(),
            format!("Spread found on {}/{}", e.spot_symbol, e.perp_symbol),
            ORANGE,
            vec![
                field("Pair", e.spot_symbol.to_string()),
                field("Spread", format!("{:.3}%", e.spread_pct)),
                field("Profit", format!("${:.2}", e.expected_profit)),
            ],
        ),
        Event::TradeOpened(e) if config.notify_trades => (
            "Trade Opened".to_string(),
            format!("Trade opened for {}", e.spot_symbol),
            GREEN,
            vec![
                field("Trade ID", e.trade_id.to_string()),
                field("Size", format!("${}", e.size)),
                field("Entry Spread", format!("{:.3}%", e.entry_spread_pct)),
            ],
        ),
        Event::TradeClosed(e) if config.notify_trades => (
            "Trade Closed".to_string(),
            format!("Trade closed for {} ({})", e.spot_symbol, e.reason),
            if e.profit.is_sign_negative() { RED } else { GREEN },
            vec![
                field("Trade ID", e.trade_id.to_string()),
                field("P&L", format!("${:.2}", e.profit)),
                field("Held", format!("{}s", e.held_secs)),
            ],
        ),
        Event::TradeRejected(e) if config.notify_trades => (
            "Trade Rejected".to_string(),
            format!("{}: {}", e.spot_symbol, e.reason),
            ORANGE,
            vec![],
        ),
        Event::CooldownStarted(e) => (
            "Cooldown Started".to_string(),
            format!(
                "{} consecutive losses, trading paused until {}",
                e.consecutive_losses,
                e.until.format("%H:%M:%S UTC")
            ),
            RED,
            vec![],
        ),
        Event::ProfitabilityReport(r) if config.notify_reports => {
            let mut fields = vec![
                field("Total Trades", r.metrics.total_trades.to_string()),
                field("Win Rate", format!("{:.1}%", r.metrics.win_rate)),
                field("Net P&L", format!("${:.2}", r.summary.total_net_profit)),
                field("ROI", format!("{:.2}%", r.summary.roi_percentage)),
                field("Balance", format!("${:.2}", r.metrics.current_balance)),
            ];
            if let Some(o) = &r.opportunities {
                fields.push(field("Opportunities", o.total_opportunities.to_string()));
                fields.push(field("Avg Spread", format!("{:.3}%", o.average_spread_pct)));
            }
            if let Some(risk) = &r.risk {
                fields.push(field("Risk", risk.level.to_string()));
            }
            (
                "Performance Summary".to_string(),
                r.recommendations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
                BLUE,
                fields,
            )
        }
        _ => return None,
    };

    Some(WebhookPayload {
        username: config.username.clone(),
        content: None,
        embeds: vec![Embed {
            title,
            description,
            color,
            fields,
            timestamp: Utc::now().to_rfc3339(),
        }],
    })
}
