//! Quote, LTP/OHLC, historical-candle and instrument-lookup handlers.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use broker_client::types::map_interval;
use core_types::{Candle, Instrument, LtpQuote, OhlcQuote, normalize_symbol};

use crate::types::{HistoricalQuery, InstrumentSearchQuery, QuoteResponse, SymbolListRequest, SymbolQuery};
use crate::{AppState, Error, Result};

/// Handler for `GET /quote?symbol=`.
///
/// Accepts unqualified symbols ("infy") and configured index names
/// ("nifty 50"); the broker is asked for the normalized form and the
/// resolved symbol is echoed back.
pub async fn quote_handler(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<QuoteResponse>> {
    let auth = state.session.require_authenticated()?;
    let symbol = normalize_symbol(&query.symbol, &state.settings.instruments.index_symbols);

    let mut quotes = state
        .broker
        .quote(&auth.access_token, std::slice::from_ref(&symbol))
        .await
        .map_err(Error::broker_read)?;

    let quote = quotes
        .remove(&symbol)
        .ok_or_else(|| Error::NotFound(format!("Quote not found for symbol: {}", symbol)))?;

    Ok(Json(QuoteResponse { symbol, quote }))
}

/// Handler for `POST /ltp`.
pub async fn ltp_handler(
    State(state): State<AppState>,
    Json(request): Json<SymbolListRequest>,
) -> Result<Json<HashMap<String, LtpQuote>>> {
    let auth = state.session.require_authenticated()?;
    let symbols = normalize_all(&state, &request.symbols);
    let ltp = state
        .broker
        .ltp(&auth.access_token, &symbols)
        .await
        .map_err(Error::broker_read)?;
    Ok(Json(ltp))
}

/// Handler for `POST /ohlc`.
pub async fn ohlc_handler(
    State(state): State<AppState>,
    Json(request): Json<SymbolListRequest>,
) -> Result<Json<HashMap<String, OhlcQuote>>> {
    let auth = state.session.require_authenticated()?;
    let symbols = normalize_all(&state, &request.symbols);
    let ohlc = state
        .broker
        .ohlc(&auth.access_token, &symbols)
        .await
        .map_err(Error::broker_read)?;
    Ok(Json(ohlc))
}

/// Handler for `GET /historical`.
///
/// `symbol` may be a numeric instrument token or any string the instrument
/// cache can resolve; `interval` accepts shorthands (5m, 15m, 1h, 1d) as
/// well as the broker's own vocabulary.
pub async fn historical_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoricalQuery>,
) -> Result<Json<Vec<Candle>>> {
    let auth = state.session.require_authenticated()?;

    let interval = map_interval(&query.interval)
        .ok_or_else(|| Error::Validation(format!("Unsupported interval '{}'", query.interval)))?;
    if query.to_date < query.from_date {
        return Err(Error::Validation(
            "to_date must not precede from_date".to_string(),
        ));
    }

    let instrument_token = match query.symbol.parse::<u32>() {
        Ok(token) => token,
        Err(_) => {
            let symbol =
                normalize_symbol(&query.symbol, &state.settings.instruments.index_symbols);
            state
                .instruments
                .resolve(&symbol, &auth.access_token)
                .await?
        }
    };

    let candles = state
        .broker
        .historical_candles(
            &auth.access_token,
            instrument_token,
            query.from_date,
            query.to_date,
            interval,
        )
        .await
        .map_err(Error::broker_read)?;

    Ok(Json(candles))
}

/// Handler for `GET /instruments?query=`.
pub async fn search_instruments_handler(
    State(state): State<AppState>,
    Query(query): Query<InstrumentSearchQuery>,
) -> Result<Json<Instrument>> {
    let auth = state.session.require_authenticated()?;
    let instrument = state
        .instruments
        .search(&query.query, &auth.access_token)
        .await?;
    Ok(Json(instrument))
}

fn normalize_all(state: &AppState, symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .map(|s| normalize_symbol(s, &state.settings.instruments.index_symbols))
        .collect()
}
