pub mod symbol;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use symbol::{normalize_symbol, split_symbol};
pub use types::{
    Candle, Depth, DepthLevel, Instrument, LtpQuote, Ohlc, OhlcQuote, OrderEvent, OrderRecord,
    OrderStatus, Position, Quote, TransactionType,
};
