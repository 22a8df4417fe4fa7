//! Order placement, modification, cancellation and portfolio pass-through
//! handlers. Every successful write schedules a webhook notification; a
//! notification that never lands does not undo the order.

use axum::Json;
use axum::extract::State;
use broker_client::{ModifyOrderParams, OrderParams};
use core_types::{OrderEvent, OrderRecord, OrderStatus, Position, TransactionType, normalize_symbol, split_symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{
    CancelOrderRequest, LegKind, ModifyOrderRequest, OrderLeg, OrderResponse, PlaceOrderRequest,
};
use crate::{AppState, Error, Result};

/// Handler for `POST /place_order`.
///
/// Business validation happens before the broker is ever contacted: a
/// bracket-product order must carry a LIMIT type, and percent legs need a
/// limit price to be relative to.
pub async fn place_order_handler(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let auth = state.session.require_authenticated()?;

    if request.quantity == 0 {
        return Err(Error::Validation("quantity must be positive".to_string()));
    }

    let is_bracket = request.product.eq_ignore_ascii_case("BO");
    if is_bracket && !request.order_type.eq_ignore_ascii_case("LIMIT") {
        return Err(Error::Validation(
            "Bracket orders (product BO) must use order_type LIMIT".to_string(),
        ));
    }

    let symbol = normalize_symbol(&request.symbol, &state.settings.instruments.index_symbols);
    let (exchange, tradingsymbol) = split_symbol(&symbol)
        .ok_or_else(|| Error::Validation(format!("Malformed symbol '{}'", request.symbol)))?;

    let stoploss = resolve_leg(request.sl.as_ref(), &request, LegSide::StopLoss)?;
    let squareoff = resolve_leg(request.target.as_ref(), &request, LegSide::Target)?;

    let params = OrderParams {
        variety: if is_bracket { "bo" } else { "regular" }.to_string(),
        exchange: exchange.to_string(),
        tradingsymbol: tradingsymbol.to_string(),
        transaction_type: request.transaction_type.as_str().to_string(),
        quantity: request.quantity,
        product: request.product.clone(),
        order_type: request.order_type.clone(),
        validity: "DAY".to_string(),
        price: request.price,
        trigger_price: request.trigger_price,
        squareoff,
        stoploss,
    };

    let order_id = state
        .broker
        .place_order(&auth.access_token, &params)
        .await
        .map_err(Error::broker_write)?;

    tracing::info!(%order_id, symbol = %symbol, "Order placed");
    notify(&state, &order_id, OrderStatus::Placed);

    Ok(Json(OrderResponse {
        order_id,
        status: OrderStatus::Placed,
    }))
}

/// Handler for `POST /modify_order`.
pub async fn modify_order_handler(
    State(state): State<AppState>,
    Json(request): Json<ModifyOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let auth = state.session.require_authenticated()?;

    if request.quantity == Some(0) {
        return Err(Error::Validation("quantity must be positive".to_string()));
    }

    let params = ModifyOrderParams {
        quantity: request.quantity,
        price: request.price,
        trigger_price: request.trigger_price,
        order_type: request.order_type.clone(),
        validity: None,
    };

    let order_id = state
        .broker
        .modify_order(&auth.access_token, &request.variety, &request.order_id, &params)
        .await
        .map_err(Error::broker_write)?;

    tracing::info!(%order_id, "Order modified");
    notify(&state, &order_id, OrderStatus::Modified);

    Ok(Json(OrderResponse {
        order_id,
        status: OrderStatus::Modified,
    }))
}

/// Handler for `POST /cancel_order`.
pub async fn cancel_order_handler(
    State(state): State<AppState>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let auth = state.session.require_authenticated()?;

    let order_id = state
        .broker
        .cancel_order(&auth.access_token, &request.variety, &request.order_id)
        .await
        .map_err(Error::broker_write)?;

    tracing::info!(%order_id, "Order cancelled");
    notify(&state, &order_id, OrderStatus::Cancelled);

    Ok(Json(OrderResponse {
        order_id,
        status: OrderStatus::Cancelled,
    }))
}

/// Handler for `GET /orders`.
pub async fn list_orders_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderRecord>>> {
    let auth = state.session.require_authenticated()?;
    let orders = state
        .broker
        .list_orders(&auth.access_token)
        .await
        .map_err(Error::broker_read)?;
    Ok(Json(orders))
}

/// Handler for `GET /positions`.
pub async fn list_positions_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Position>>> {
    let auth = state.session.require_authenticated()?;
    let positions = state
        .broker
        .list_positions(&auth.access_token)
        .await
        .map_err(Error::broker_read)?;
    Ok(Json(positions))
}

fn notify(state: &AppState, order_id: &str, status: OrderStatus) {
    state.webhooks.notify(&OrderEvent {
        order_id: order_id.to_string(),
        status,
    });
}

#[derive(Clone, Copy)]
enum LegSide {
    StopLoss,
    Target,
}

/// Turns a stop-loss or target leg into the absolute price the broker's
/// bracket fields expect. Absolute legs pass through as-is; percent legs are
/// offsets from the limit price, signed by which side of the entry the leg
/// protects.
fn resolve_leg(
    leg: Option<&OrderLeg>,
    request: &PlaceOrderRequest,
    side: LegSide,
) -> Result<Option<Decimal>> {
    let Some(leg) = leg else {
        return Ok(None);
    };

    match leg.kind {
        LegKind::Absolute => Ok(Some(leg.value)),
        LegKind::Percent => {
            let price = request.price.ok_or_else(|| {
                Error::Validation("Percent legs require a limit price".to_string())
            })?;
            let offset = price * leg.value / dec!(100);
            // A long's stop sits below the entry and its target above; a
            // short's legs mirror that.
            let signed = match (side, request.transaction_type) {
                (LegSide::StopLoss, TransactionType::Buy) => price - offset,
                (LegSide::StopLoss, TransactionType::Sell) => price + offset,
                (LegSide::Target, TransactionType::Buy) => price + offset,
                (LegSide::Target, TransactionType::Sell) => price - offset,
            };
            Ok(Some(signed.round_dp(2)))
        }
    }
}
