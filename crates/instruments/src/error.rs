use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Symbol '{0}' not found. Use the EXCHANGE:TRADINGSYMBOL format.")]
    SymbolNotFound(String),
    #[error("No instrument matches '{0}'")]
    InstrumentNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
