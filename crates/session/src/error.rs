use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not connected to the broker. Please login first.")]
    Unauthenticated,
}

pub type Result<T> = std::result::Result<T, Error>;
