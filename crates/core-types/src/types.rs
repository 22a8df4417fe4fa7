use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single entry from the broker's tradable-instrument catalog.
///
/// Immutable once fetched; uniqueness of `(exchange, tradingsymbol)` is
/// assumed from the broker but not enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_token: u32,
    pub tradingsymbol: String,
    pub exchange: String,
    pub lot_size: u32,
}

/// One OHLCV bar as returned by the broker's historical-data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<FixedOffset>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

/// Open/high/low/close snapshot inside a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// A single visible order-book level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Decimal,
    pub quantity: i64,
    pub orders: i64,
}

/// The visible order book on both sides of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depth {
    pub buy: Vec<DepthLevel>,
    pub sell: Vec<DepthLevel>,
}

/// A full market quote for one instrument.
///
/// Everything beyond `instrument_token` and `last_price` is nullable: index
/// quotes carry no volume, depth or open interest, so the optional fields
/// give the API surface a single shape instead of dropping keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub instrument_token: u32,
    pub last_price: Decimal,
    pub timestamp: Option<String>,
    pub volume: Option<i64>,
    pub buy_quantity: Option<i64>,
    pub sell_quantity: Option<i64>,
    pub last_quantity: Option<i64>,
    pub average_price: Option<Decimal>,
    pub last_trade_time: Option<String>,
    pub oi: Option<i64>,
    pub oi_day_high: Option<i64>,
    pub oi_day_low: Option<i64>,
    pub net_change: Option<Decimal>,
    pub lower_circuit_limit: Option<Decimal>,
    pub upper_circuit_limit: Option<Decimal>,
    pub ohlc: Option<Ohlc>,
    pub depth: Option<Depth>,
}

/// Last-traded-price snapshot (the lightest quote shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtpQuote {
    pub instrument_token: u32,
    pub last_price: Decimal,
}

/// OHLC + last price snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcQuote {
    pub instrument_token: u32,
    pub last_price: Decimal,
    pub ohlc: Ohlc,
}

/// The side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

/// Lifecycle state reported back to the caller and to webhook subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Placed,
    Modified,
    Cancelled,
}

/// Payload fanned out to webhook subscribers after an order-lifecycle call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub status: OrderStatus,
}

/// One row from the broker's order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub status: String,
    pub tradingsymbol: Option<String>,
    pub exchange: Option<String>,
    pub transaction_type: Option<String>,
    pub quantity: Option<i64>,
    pub filled_quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub product: Option<String>,
    pub order_type: Option<String>,
    pub order_timestamp: Option<String>,
}

/// One net position as exposed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub average_price: Decimal,
    pub pnl: Decimal,
    pub product: String,
}
