//! Target and risk calculators: thin orchestration around the pure
//! functions in the `risk` crate.

use axum::Json;
use axum::extract::State;
use broker_client::MarginOrderParams;
use chrono::{Days, Local};
use core_types::{TransactionType, normalize_symbol, split_symbol};
use risk::{
    ATR_PERIOD, SizeBy, TargetLevels, compute_targets, margin_per_unit, size_position, wilder_atr,
};
use rust_decimal::Decimal;

use crate::types::{RiskCheckRequest, RiskCheckResponse, TargetCalcRequest};
use crate::{AppState, Error, Result};

/// How far back to reach for daily candles so the ATR window is always
/// covered, weekends and exchange holidays included.
const ATR_LOOKBACK_DAYS: u64 = 45;

/// Handler for `POST /target/calc`.
///
/// Resolves the symbol, pulls the trailing daily candles and derives
/// ATR-based stop/target levels around the caller's entry price.
pub async fn target_calc_handler(
    State(state): State<AppState>,
    Json(request): Json<TargetCalcRequest>,
) -> Result<Json<TargetLevels>> {
    let auth = state.session.require_authenticated()?;
    let symbol = normalize_symbol(&request.symbol, &state.settings.instruments.index_symbols);
    let instrument_token = state.instruments.resolve(&symbol, &auth.access_token).await?;

    let to_date = Local::now().date_naive();
    let from_date = to_date
        .checked_sub_days(Days::new(ATR_LOOKBACK_DAYS))
        .unwrap_or(to_date);

    let candles = state
        .broker
        .historical_candles(&auth.access_token, instrument_token, from_date, to_date, "day")
        .await
        .map_err(Error::broker_read)?;

    let atr = wilder_atr(&candles, ATR_PERIOD)?;
    Ok(Json(compute_targets(
        request.entry_price,
        atr,
        request.sl_atr_multiplier,
        request.target_atr_multiplier,
    )))
}

/// Handler for `POST /risk/check`.
///
/// Sizes the trade from exactly one of `quantity` / `risk_capital`, then
/// prices the margin: the broker's one-unit estimate when a symbol is given
/// and the estimate is positive, a 20% notional fallback otherwise.
pub async fn risk_check_handler(
    State(state): State<AppState>,
    Json(request): Json<RiskCheckRequest>,
) -> Result<Json<RiskCheckResponse>> {
    let auth = state.session.require_authenticated()?;

    let size_by = match (request.quantity, request.risk_capital) {
        (Some(quantity), None) => SizeBy::Quantity(quantity),
        (None, Some(capital)) => SizeBy::RiskCapital(capital),
        _ => {
            return Err(Error::Validation(
                "Provide exactly one of 'quantity' or 'risk_capital'".to_string(),
            ));
        }
    };

    let size = size_position(request.entry, request.stop_loss, size_by)?;

    let broker_estimate = match &request.symbol {
        Some(raw) => {
            let symbol = normalize_symbol(raw, &state.settings.instruments.index_symbols);
            let (exchange, tradingsymbol) = split_symbol(&symbol)
                .ok_or_else(|| Error::Validation(format!("Malformed symbol '{}'", raw)))?;
            let params = MarginOrderParams {
                exchange: exchange.to_string(),
                tradingsymbol: tradingsymbol.to_string(),
                transaction_type: TransactionType::Buy.as_str().to_string(),
                variety: "regular".to_string(),
                product: "MIS".to_string(),
                order_type: "MARKET".to_string(),
                quantity: 1,
                price: None,
            };
            state
                .broker
                .estimate_margin(&auth.access_token, &params)
                .await
                .map_err(Error::broker_read)?
        }
        None => Decimal::ZERO,
    };

    let per_unit = margin_per_unit(broker_estimate, request.entry);
    let margin_required = (per_unit * Decimal::from(size.units)).round_dp(2);

    Ok(Json(RiskCheckResponse {
        cash_risk: size.cash_risk,
        margin_required,
        suggested_quantity: size.suggested_quantity,
        rr_ratio: None,
    }))
}
