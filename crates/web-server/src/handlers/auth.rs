//! Login-flow, session-status and webhook-subscription handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Html;

use crate::types::{CallbackParams, LoginUrlResponse, SubscribeRequest, SubscribeResponse};
use crate::{AppState, Error, Result};

/// Handler for `GET /auth/login_url`.
pub async fn login_url_handler(State(state): State<AppState>) -> Json<LoginUrlResponse> {
    Json(LoginUrlResponse {
        login_url: state.broker.login_url(),
    })
}

/// Handler for `GET /auth/callback`.
///
/// This is a browser-redirect target, not an API consumer: it always
/// answers 200 with an HTML page, describing either the established session
/// or the broker's failure message.
pub async fn callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let Some(request_token) = params.request_token else {
        return failure_page("No request_token in the callback URL");
    };

    match state.broker.exchange_session(&request_token).await {
        Ok(broker_session) => {
            tracing::info!(user_id = %broker_session.user_id, "Broker session established");
            state
                .session
                .connect(broker_session.access_token, broker_session.user_id.clone());
            Html(format!(
                "<html><body>\
                 <h1>Authentication Successful!</h1>\
                 <p>Connected as <b>{}</b>. You can close this tab.</p>\
                 </body></html>",
                broker_session.user_id
            ))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session exchange failed");
            failure_page(&e.to_string())
        }
    }
}

fn failure_page(detail: &str) -> Html<String> {
    Html(format!(
        "<html><body>\
         <h1>Authentication Failed</h1>\
         <p>{}</p>\
         </body></html>",
        detail
    ))
}

/// Handler for `GET /auth/status`.
pub async fn status_handler(State(state): State<AppState>) -> Json<session::SessionStatus> {
    Json(state.session.status())
}

/// Handler for `POST /webhook/subscribe`.
pub async fn subscribe_webhook_handler(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    state.session.require_authenticated()?;

    let webhook_id = state
        .webhooks
        .subscribe(&request.url)
        .map_err(|e| Error::Validation(e.to_string()))?;

    tracing::info!(%webhook_id, url = %request.url, "Webhook subscribed");
    Ok(Json(SubscribeResponse {
        ok: true,
        webhook_id,
    }))
}
