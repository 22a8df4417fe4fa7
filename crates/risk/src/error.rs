use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not enough candle history for a stable ATR: need {required}, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid risk parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, Error>;
