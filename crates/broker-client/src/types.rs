use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of a successful request-token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSession {
    pub access_token: String,
    pub user_id: String,
}

/// Parameters for placing a new order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderParams {
    pub variety: String,
    pub exchange: String,
    pub tradingsymbol: String,
    pub transaction_type: String,
    pub quantity: u32,
    pub product: String,
    pub order_type: String,
    pub validity: String,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    /// Bracket-order target leg, in absolute price points.
    pub squareoff: Option<Decimal>,
    /// Bracket-order stop-loss leg, in absolute price points.
    pub stoploss: Option<Decimal>,
}

/// Parameters for modifying a pending order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModifyOrderParams {
    pub quantity: Option<u32>,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub order_type: Option<String>,
    pub validity: Option<String>,
}

/// The order described to the margin-estimation API.
#[derive(Debug, Clone, Serialize)]
pub struct MarginOrderParams {
    pub exchange: String,
    pub tradingsymbol: String,
    pub transaction_type: String,
    pub variety: String,
    pub product: String,
    pub order_type: String,
    pub quantity: u32,
    pub price: Option<Decimal>,
}

/// One row of the instrument CSV dump. Columns the gateway does not use
/// (expiry, strike, tick size, ...) are simply not declared.
#[derive(Debug, Deserialize)]
pub struct InstrumentCsvRow {
    pub instrument_token: u32,
    pub tradingsymbol: String,
    pub exchange: String,
    pub lot_size: u32,
}

/// Maps a user-facing interval shorthand to the broker's interval vocabulary.
///
/// Returns `None` for intervals the broker does not understand.
pub fn map_interval(raw: &str) -> Option<&'static str> {
    match raw {
        "1m" | "minute" => Some("minute"),
        "3m" | "3minute" => Some("3minute"),
        "5m" | "5minute" => Some("5minute"),
        "10m" | "10minute" => Some("10minute"),
        "15m" | "15minute" => Some("15minute"),
        "30m" | "30minute" => Some("30minute"),
        "1h" | "60m" | "60minute" => Some("60minute"),
        "1d" | "day" => Some("day"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthands_map_to_broker_vocabulary() {
        assert_eq!(map_interval("5m"), Some("5minute"));
        assert_eq!(map_interval("15m"), Some("15minute"));
        assert_eq!(map_interval("1h"), Some("60minute"));
        assert_eq!(map_interval("1d"), Some("day"));
    }

    #[test]
    fn broker_vocabulary_passes_through() {
        assert_eq!(map_interval("day"), Some("day"));
        assert_eq!(map_interval("60minute"), Some("60minute"));
    }

    #[test]
    fn unknown_intervals_are_rejected() {
        assert_eq!(map_interval("2h"), None);
        assert_eq!(map_interval(""), None);
    }
}
