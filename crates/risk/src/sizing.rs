use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;

/// How the caller wants the position sized: by a fixed quantity, or by the
/// cash they are willing to lose if the stop is hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeBy {
    Quantity(u32),
    RiskCapital(Decimal),
}

/// The cash-at-risk figures for a proposed trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSize {
    pub cash_risk: Decimal,
    /// Populated only when sizing by risk capital.
    pub suggested_quantity: Option<u64>,
    /// The unit count the margin requirement applies to.
    pub units: u64,
}

/// Computes cash-at-risk and, when sizing by risk capital, the largest
/// whole-unit position that keeps the loss within that capital.
pub fn size_position(entry: Decimal, stop_loss: Decimal, size_by: SizeBy) -> Result<PositionSize> {
    let per_unit_risk = (entry - stop_loss).abs();

    match size_by {
        SizeBy::Quantity(quantity) => {
            let units = u64::from(quantity);
            Ok(PositionSize {
                cash_risk: (per_unit_risk * Decimal::from(units)).round_dp(2),
                suggested_quantity: None,
                units,
            })
        }
        SizeBy::RiskCapital(risk_capital) => {
            if risk_capital <= Decimal::ZERO {
                return Err(Error::InvalidParameters(
                    "risk_capital must be positive".to_string(),
                ));
            }
            if per_unit_risk <= Decimal::ZERO {
                return Err(Error::InvalidParameters(
                    "stop_loss must differ from entry to size by risk_capital".to_string(),
                ));
            }
            let suggested = (risk_capital / per_unit_risk).floor();
            let units = suggested.to_u64().unwrap_or(0);
            Ok(PositionSize {
                cash_risk: (per_unit_risk * Decimal::from(units)).round_dp(2),
                suggested_quantity: Some(units),
                units,
            })
        }
    }
}

/// The margin charged per unit: the broker's estimate when it is positive,
/// otherwise a conservative 20% of the entry price (the margin API
/// under-estimates some instruments as zero).
pub fn margin_per_unit(broker_estimate: Decimal, entry: Decimal) -> Decimal {
    if broker_estimate > Decimal::ZERO {
        broker_estimate
    } else {
        entry * dec!(0.20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_quantity_cash_risk() {
        let size = size_position(dec!(100), dec!(98), SizeBy::Quantity(50)).unwrap();
        assert_eq!(size.cash_risk, dec!(100.00));
        assert_eq!(size.suggested_quantity, None);
        assert_eq!(size.units, 50);
    }

    #[test]
    fn risk_capital_sizing_floors_to_whole_units() {
        let size = size_position(dec!(1500), dec!(1490), SizeBy::RiskCapital(dec!(500))).unwrap();
        assert_eq!(size.suggested_quantity, Some(50));
        assert_eq!(size.cash_risk, dec!(500.00));

        // 500 / 3 = 166.67 units; only 166 whole units fit.
        let size = size_position(dec!(103), dec!(100), SizeBy::RiskCapital(dec!(500))).unwrap();
        assert_eq!(size.suggested_quantity, Some(166));
        assert_eq!(size.cash_risk, dec!(498.00));
    }

    #[test]
    fn zero_distance_stop_rejects_risk_capital_sizing() {
        let err = size_position(dec!(100), dec!(100), SizeBy::RiskCapital(dec!(500))).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));

        // ...but a fixed quantity is still fine; the trade just risks nothing.
        let size = size_position(dec!(100), dec!(100), SizeBy::Quantity(10)).unwrap();
        assert_eq!(size.cash_risk, dec!(0.00));
    }

    #[test]
    fn non_positive_risk_capital_is_rejected() {
        // Flooring a negative budget would otherwise collapse to 0 units and
        // report a riskless trade.
        let err = size_position(dec!(100), dec!(98), SizeBy::RiskCapital(dec!(-500))).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));

        let err = size_position(dec!(100), dec!(98), SizeBy::RiskCapital(Decimal::ZERO)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
    }

    #[test]
    fn short_side_distance_is_absolute() {
        let size = size_position(dec!(98), dec!(100), SizeBy::Quantity(50)).unwrap();
        assert_eq!(size.cash_risk, dec!(100.00));
    }

    #[test]
    fn margin_falls_back_to_twenty_percent_on_zero_estimate() {
        assert_eq!(margin_per_unit(dec!(0), dec!(500)), dec!(100.0));
        assert_eq!(margin_per_unit(dec!(123.45), dec!(500)), dec!(123.45));

        // The §8 worked example: estimate 0, entry 500, quantity 10.
        let required = (margin_per_unit(dec!(0), dec!(500)) * Decimal::from(10u64)).round_dp(2);
        assert_eq!(required, dec!(1000.00));
    }
}
