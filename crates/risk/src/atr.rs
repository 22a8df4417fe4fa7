use crate::{Error, Result};
use core_types::Candle;
use rust_decimal::Decimal;

/// Computes the latest Average True Range over `candles` using Wilder's
/// smoothing.
///
/// True range per period is `max(high - low, |high - prev_close|,
/// |low - prev_close|)`; the first `period` true ranges seed the average and
/// every later one folds in as `atr = (atr * (period - 1) + tr) / period`.
///
/// Needs at least `period + 1` candles (one lost to the previous-close
/// reference), otherwise fails with `InsufficientHistory`.
pub fn wilder_atr(candles: &[Candle], period: usize) -> Result<Decimal> {
    if period == 0 {
        return Err(Error::InvalidParameters(
            "ATR period must be positive".to_string(),
        ));
    }
    let required = period + 1;
    if candles.len() < required {
        return Err(Error::InsufficientHistory {
            required,
            available: candles.len(),
        });
    }

    let true_ranges: Vec<Decimal> = candles
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .collect();

    let n = Decimal::from(period as u64);
    let mut atr: Decimal = true_ranges[..period].iter().sum::<Decimal>() / n;
    for tr in &true_ranges[period..] {
        atr = (atr * (n - Decimal::ONE) + tr) / n;
    }
    Ok(atr)
}

fn true_range(candle: &Candle, prev_close: Decimal) -> Decimal {
    let high_low = candle.high - candle.low;
    let high_close = (candle.high - prev_close).abs();
    let low_close = (candle.low - prev_close).abs();
    high_low.max(high_close).max(low_close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    fn candle(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            time: DateTime::parse_from_rfc3339("2024-01-01T09:15:00+05:30").unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn flat_range_series(len: usize) -> Vec<Candle> {
        // Every bar spans exactly 2 points around the same close, so every
        // true range is 2 and the smoothed ATR must be exactly 2.
        (0..len)
            .map(|_| candle(dec!(100), dec!(101), dec!(99), dec!(100)))
            .collect()
    }

    #[test]
    fn constant_range_series_gives_exact_atr() {
        let atr = wilder_atr(&flat_range_series(45), 14).unwrap();
        assert_eq!(atr, dec!(2));
    }

    #[test]
    fn gap_is_captured_through_prev_close() {
        // A bar gapping far above the previous close must widen the true
        // range beyond its own high-low span.
        let mut candles = flat_range_series(15);
        candles.push(candle(dec!(110), dec!(111), dec!(109), dec!(110)));
        let atr = wilder_atr(&candles, 14).unwrap();
        // Last TR = |111 - 100| = 11, folded in once: (2*13 + 11) / 14.
        assert_eq!(atr, (dec!(2) * dec!(13) + dec!(11)) / dec!(14));
    }

    #[test]
    fn too_few_candles_is_an_error() {
        let err = wilder_atr(&flat_range_series(14), 14).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientHistory {
                required: 15,
                available: 14
            }
        ));
        assert!(matches!(
            wilder_atr(&[], 14),
            Err(Error::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(matches!(
            wilder_atr(&flat_range_series(5), 0),
            Err(Error::InvalidParameters(_))
        ));
    }
}
