/// Number of yearly values produced when the caller does not ask for another horizon.
pub const DEFAULT_PROJECTION_YEARS: usize = 20;

fn cents_to_currency(rate_cents: f64) -> f64 {
    rate_cents / 100.0
}

/// Yearly cost of `consumption_kwh` at `rate_cents` per kWh, escalated by
/// `escalator` (fraction) each year.
///
/// Year 0 uses the unescalated rate; escalation compounds after each recorded
/// year. Always returns exactly `years` values, unrounded.
pub fn project(consumption_kwh: f64, rate_cents: f64, escalator: f64, years: usize) -> Vec<f64> {
    std::iter::successors(Some(cents_to_currency(rate_cents)), |rate| Some(rate * (1.0 + escalator)))
        .take(years)
        .map(|rate| consumption_kwh * rate)
        .collect()
}

/// Cost of the first projected year. Identical to `project(..)[0]`.
pub fn first_year_cost(consumption_kwh: f64, rate_cents: f64) -> f64 {
    consumption_kwh * cents_to_currency(rate_cents)
}
