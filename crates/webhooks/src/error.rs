use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("'{0}' is not a valid http(s) webhook URL")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, Error>;
