pub mod auth;
pub mod calc;
pub mod market_data;
pub mod orders;
