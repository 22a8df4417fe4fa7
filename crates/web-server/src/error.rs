use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Everything a handler can fail with, mapped onto the gateway's HTTP error
/// taxonomy in `IntoResponse`.
#[derive(Error, Debug)]
pub enum Error {
    /// `x-api-key` header absent entirely.
    #[error("Not authenticated")]
    MissingApiKey,
    /// `x-api-key` header present but wrong.
    #[error("Invalid or missing API Key")]
    InvalidApiKey,
    #[error(transparent)]
    Unauthenticated(#[from] session::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    /// Broker failure during a read or computation.
    #[error("{0}")]
    BrokerRead(String),
    /// Broker failure during an order write.
    #[error("{0}")]
    BrokerWrite(String),
    /// Calculator failure (e.g. not enough candle history).
    #[error("{0}")]
    Computation(String),
    #[error("Failed to bind server address: {0}")]
    ServerBindError(std::io::Error),
}

impl Error {
    pub fn broker_read(e: broker_client::Error) -> Self {
        Error::BrokerRead(e.to_string())
    }

    pub fn broker_write(e: broker_client::Error) -> Self {
        Error::BrokerWrite(e.to_string())
    }
}

impl From<instruments::Error> for Error {
    fn from(e: instruments::Error) -> Self {
        Error::NotFound(e.to_string())
    }
}

impl From<risk::Error> for Error {
    fn from(e: risk::Error) -> Self {
        match e {
            risk::Error::InsufficientHistory { .. } => Error::Computation(e.to_string()),
            risk::Error::InvalidParameters(_) => Error::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::MissingApiKey => StatusCode::FORBIDDEN,
            Error::InvalidApiKey | Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::BrokerWrite(_) => StatusCode::BAD_REQUEST,
            Error::BrokerRead(_) | Error::Computation(_) | Error::ServerBindError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(%status, detail = %self, "Request failed");
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
