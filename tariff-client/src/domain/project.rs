use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use time::OffsetDateTime;

/// A persisted tariff request outcome.
///
/// Rows are written once and never updated; they disappear only when the owning
/// user is deleted (`ON DELETE CASCADE`).
#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub kwh: i32,
    /// Annual escalation as a fraction (0.04 = 4%).
    pub escalator: f64,
    pub selected_tariff: String,
    pub cost_first_year: Decimal,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: i64,
    pub address: String,
    pub kwh: i32,
    pub escalator: f64,
    pub selected_tariff: String,
    pub cost_first_year: Decimal,
}

/// Convert a raw currency amount into a cent-precision decimal.
///
/// Returns `None` for NaN and infinities.
pub fn currency_from_f64(value: f64) -> Option<Decimal> {
    let mut amount = Decimal::from_f64(value)?.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn currency_rounds_to_cents() {
        let d = currency_from_f64(123.456_7).unwrap();
        assert_eq!(d, Decimal::from_str("123.46").unwrap());
    }

    #[test]
    fn currency_keeps_whole_amounts() {
        let d = currency_from_f64(50.0).unwrap();
        assert_eq!(d, Decimal::from_str("50.00").unwrap());
        assert_eq!(d.to_string(), "50.00");
    }

    #[test]
    fn currency_rejects_non_finite() {
        assert!(currency_from_f64(f64::NAN).is_none());
        assert!(currency_from_f64(f64::INFINITY).is_none());
    }
}
