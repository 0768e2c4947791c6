//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;

use owo_colors::OwoColorize;
use rust_decimal::Decimal;

/// Print the application header with name and version.
pub fn header() {
    println!(
        "{} {}",
        "spreadhound".bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

/// Print a section header.
pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    println!("  {:<20} {}", label.dimmed(), value);
}

/// Print a success line.
pub fn success(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line.
pub fn error(message: &str) {
    eprintln!("  {} {}", "×".red(), message);
}

/// Render a dollar amount, green when positive and red when negative.
pub fn usd(amount: Decimal) -> String {
    let text = format!("${}", amount.round_dp(2));
    if amount > Decimal::ZERO {
        text.green().to_string()
    } else if amount < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

/// Render a percentage with two decimals.
pub fn pct(value: Decimal) -> String {
    format!("{}%", value.round_dp(2))
}

/// Print an indented table.
pub fn table(rendered: &str) {
    for line in rendered.lines() {
        println!("  {line}");
    }
}
