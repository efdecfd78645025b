//! Compose the run summary sent after each scan.

use crate::extraction::Position;
use chrono::{DateTime, Utc};

const ALERT_SUBJECT: &str = "vaultwatch Alert: Target perp positions detected";
const UPDATE_SUBJECT: &str = "vaultwatch Update: Target perp positions absent";

/// A subject and plain-text body ready for a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

/// Positions whose canonical symbol is one of `targets`, in table order.
pub fn select_targets<'a>(positions: &'a [Position], targets: &[String]) -> Vec<&'a Position> {
    positions
        .iter()
        .filter(|p| targets.iter().any(|t| *t == p.coin_symbol))
        .collect()
}

/// Build the alert (targets present) or update (targets absent) message.
pub fn build_message(positions: &[Position], targets: &[String], now: DateTime<Utc>) -> Message {
    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let matched = select_targets(positions, targets);

    if matched.is_empty() {
        Message {
            subject: UPDATE_SUBJECT.to_string(),
            body: absent_body(positions, targets, &timestamp),
        }
    } else {
        Message {
            subject: ALERT_SUBJECT.to_string(),
            body: present_body(&matched, positions.len(), &timestamp),
        }
    }
}

fn present_body(matched: &[&Position], total: usize, timestamp: &str) -> String {
    let mut lines = vec![
        format!("vaultwatch scan completed at {timestamp} UTC."),
        String::new(),
        "The following target coins are currently in the vault's perp positions:".to_string(),
    ];
    for position in matched {
        lines.extend(position_lines(position));
        lines.push(String::new());
    }
    lines.push(format!("Total perp positions inspected: {total}"));

    lines.join("\n").trim().to_string()
}

fn absent_body(positions: &[Position], targets: &[String], timestamp: &str) -> String {
    let mut lines = vec![
        format!(
            "None of your target coins ({}) are present in the account's perp positions.",
            targets.join(", ")
        ),
        String::new(),
        format!("Scan completed at {timestamp} UTC."),
        format!("Total perp positions inspected: {}", positions.len()),
    ];
    if !positions.is_empty() {
        lines.push(String::new());
        lines.push("Visible perp positions:".to_string());
        for position in positions {
            lines.extend(position_lines(position));
            lines.push(String::new());
        }
    }

    lines.join("\n").trim().to_string()
}

/// The per-position block shared by both bodies.
pub fn position_lines(position: &Position) -> [String; 6] {
    [
        format!(
            "- Coin: {} (symbol: {})",
            position.coin_display, position.coin_symbol
        ),
        format!("  Leverage: {}", position.leverage),
        format!("  Size: {}", position.size_text),
        format!("  Mark Price: {}", position.mark_price_text),
        format!("  PNL (ROE %): {}", position.pnl_roe),
        format!("  Position Value: {}", position.value_descriptor()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ValueSource;
    use chrono::TimeZone;

    fn position(symbol: &str, source: ValueSource) -> Position {
        Position {
            coin_display: format!("{symbol}-PERP"),
            coin_symbol: symbol.to_string(),
            leverage: "10x".to_string(),
            size_text: "2".to_string(),
            size_num: Some(2.0),
            mark_price_text: "$100".to_string(),
            mark_price_num: Some(100.0),
            pnl_roe: "$5 (2.5%)".to_string(),
            position_value_text: "$200.00".to_string(),
            position_value_num: Some(200.0),
            position_value_source: source,
        }
    }

    fn targets() -> Vec<String> {
        ["HYPE", "BTC", "ETH", "SOL", "XRP"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_select_targets_keeps_order() {
        let positions = vec![
            position("DOGE", ValueSource::Scraped),
            position("SOL", ValueSource::Scraped),
            position("BTC", ValueSource::Scraped),
        ];
        let picked: Vec<_> = select_targets(&positions, &targets())
            .into_iter()
            .map(|p| p.coin_symbol.as_str())
            .collect();
        assert_eq!(picked, vec!["SOL", "BTC"]);
    }

    #[test]
    fn test_alert_message() {
        let positions = vec![
            position("BTC", ValueSource::Computed),
            position("DOGE", ValueSource::Scraped),
        ];

        let message = build_message(&positions, &targets(), now());

        assert_eq!(message.subject, ALERT_SUBJECT);
        assert_eq!(
            message.body,
            "vaultwatch scan completed at 2026-03-01 12:30:05 UTC.\n\
             \n\
             The following target coins are currently in the vault's perp positions:\n\
             - Coin: BTC-PERP (symbol: BTC)\n\
             \x20 Leverage: 10x\n\
             \x20 Size: 2\n\
             \x20 Mark Price: $100\n\
             \x20 PNL (ROE %): $5 (2.5%)\n\
             \x20 Position Value: $200.00 (computed)\n\
             \n\
             Total perp positions inspected: 2"
        );
    }

    #[test]
    fn test_update_message_lists_visible_positions() {
        let positions = vec![position("DOGE", ValueSource::Scraped)];

        let message = build_message(&positions, &targets(), now());

        assert_eq!(message.subject, UPDATE_SUBJECT);
        assert!(message.body.starts_with(
            "None of your target coins (HYPE, BTC, ETH, SOL, XRP) are present in the account's perp positions.\n\n\
             Scan completed at 2026-03-01 12:30:05 UTC.\n\
             Total perp positions inspected: 1\n\n\
             Visible perp positions:\n\
             - Coin: DOGE-PERP (symbol: DOGE)"
        ));
        assert!(message.body.ends_with("  Position Value: $200.00"));
    }

    #[test]
    fn test_update_message_without_positions() {
        let message = build_message(&[], &targets(), now());

        assert_eq!(message.subject, UPDATE_SUBJECT);
        assert!(message.body.ends_with("Total perp positions inspected: 0"));
        assert!(!message.body.contains("Visible perp positions"));
    }
}
