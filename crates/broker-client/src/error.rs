use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the broker client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Broker API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Session exchange failed: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, Error>;
