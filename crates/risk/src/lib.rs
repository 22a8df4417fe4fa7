//! Pure trade calculators: Wilder's ATR, stop/target levels and
//! position-sizing/margin figures.
//!
//! Everything in this crate is side-effect free; the web layer fetches the
//! supporting data (candles, margin estimates) and feeds it in.

pub mod atr;
pub mod error;
pub mod sizing;
pub mod target;

// Re-export public types
pub use atr::wilder_atr;
pub use error::{Error, Result};
pub use sizing::{PositionSize, SizeBy, margin_per_unit, size_position};
pub use target::{TargetLevels, compute_targets};

/// Default ATR lookback, in periods.
pub const ATR_PERIOD: usize = 14;
