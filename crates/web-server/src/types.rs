use chrono::NaiveDate;
use core_types::{OrderStatus, Quote, TransactionType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Seconds since the process started serving.
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct LoginUrlResponse {
    pub login_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub request_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub ok: bool,
    pub webhook_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: String,
}

/// A full quote with the resolved symbol echoed back.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub symbol: String,
    #[serde(flatten)]
    pub quote: Quote,
}

#[derive(Debug, Deserialize)]
pub struct SymbolListRequest {
    pub symbols: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    pub symbol: String,
    pub interval: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct InstrumentSearchQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct TargetCalcRequest {
    pub symbol: String,
    pub entry_price: Decimal,
    #[serde(default = "default_sl_multiplier")]
    pub sl_atr_multiplier: Decimal,
    #[serde(default = "default_target_multiplier")]
    pub target_atr_multiplier: Decimal,
}

fn default_sl_multiplier() -> Decimal {
    dec!(1.5)
}

fn default_target_multiplier() -> Decimal {
    dec!(3.0)
}

#[derive(Debug, Deserialize)]
pub struct RiskCheckRequest {
    /// Optional: without it the margin estimate skips the broker and uses
    /// the synthetic fallback.
    pub symbol: Option<String>,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub quantity: Option<u32>,
    pub risk_capital: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct RiskCheckResponse {
    pub cash_risk: Decimal,
    pub margin_required: Decimal,
    pub suggested_quantity: Option<u64>,
    /// Reserved for future use; always null today.
    pub rr_ratio: Option<Decimal>,
}

/// A stop-loss or target leg attached to a bracket order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLeg {
    #[serde(rename = "type")]
    pub kind: LegKind,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegKind {
    /// The leg value is an absolute price.
    Absolute,
    /// The leg value is a percentage offset from the limit price.
    Percent,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub symbol: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub order_type: String,
    pub product: String,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub sl: Option<OrderLeg>,
    pub target: Option<OrderLeg>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyOrderRequest {
    pub order_id: String,
    #[serde(default = "default_variety")]
    pub variety: String,
    pub quantity: Option<u32>,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub order_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub order_id: String,
    #[serde(default = "default_variety")]
    pub variety: String,
}

fn default_variety() -> String {
    "regular".to_string()
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub status: OrderStatus,
}
