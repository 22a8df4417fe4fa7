use rust_decimal::Decimal;
use serde::Serialize;

/// ATR-derived stop-loss and target levels for a long entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetLevels {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target1: Decimal,
    pub target2: Decimal,
    pub rr_ratio: Decimal,
}

/// Derives stop/target levels from an entry price and a volatility measure.
///
/// `stop_loss = entry - sl_mult * atr`, `target1 = entry + tgt_mult * atr`,
/// `target2 = target1 + tgt_mult * atr / 2`, each rounded to 2 decimals.
/// The reward-to-risk ratio is defined as 0 when risk is not positive, so a
/// degenerate stop never raises a division error.
pub fn compute_targets(
    entry: Decimal,
    atr: Decimal,
    sl_multiplier: Decimal,
    target_multiplier: Decimal,
) -> TargetLevels {
    let stop_loss = (entry - sl_multiplier * atr).round_dp(2);
    let target1 = (entry + target_multiplier * atr).round_dp(2);
    let target2 = (target1 + target_multiplier * atr / Decimal::TWO).round_dp(2);

    let risk = entry - stop_loss;
    let reward = target1 - entry;
    let rr_ratio = if risk > Decimal::ZERO {
        (reward / risk).round_dp(2)
    } else {
        Decimal::ZERO
    };

    TargetLevels {
        entry,
        stop_loss,
        target1,
        target2,
        rr_ratio,
    }
}
