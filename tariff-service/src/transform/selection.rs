use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Rate items starting in this year or earlier never become candidates.
pub const LAST_EXCLUDED_YEAR: i32 = 2021;

/// One entry of the external rate database, decoded leniently.
///
/// Every field is optional on the wire; [`RateRecord::name`] and friends apply
/// the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateRecord {
    name: Option<String>,
    utility: Option<String>,
    /// Unix seconds, possibly fractional.
    startdate: Option<f64>,
    approved: Option<bool>,
    is_default: Option<bool>,
    /// The source's unique identifier for the tariff.
    label: Option<String>,
    #[serde(rename = "energyratestructure")]
    energy_rate_structure: Option<Vec<Vec<RateTier>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateTier {
    /// Cents per kWh.
    rate: Option<f64>,
}

impl RateRecord {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn utility(&self) -> &str {
        self.utility.as_deref().unwrap_or("Unknown")
    }

    /// Start date in UTC. Missing or unrepresentable timestamps map to the epoch.
    pub fn start_date(&self) -> Date {
        let secs = self.startdate.unwrap_or(0.0).floor() as i64;
        OffsetDateTime::from_unix_timestamp(secs)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
            .date()
    }

    pub fn is_most_likely(&self) -> bool {
        self.approved.unwrap_or(false) && self.is_default.unwrap_or(false)
    }

    /// Mean of the first tier's rate over every period of the energy rate structure.
    ///
    /// A missing or empty structure yields 0; a period without tiers counts as 0.
    pub fn average_rate(&self) -> f64 {
        match self.energy_rate_structure.as_deref() {
            Some(periods) if !periods.is_empty() => {
                let total: f64 = periods
                    .iter()
                    .map(|period| period.first().and_then(|tier| tier.rate).unwrap_or(0.0))
                    .sum();
                total / periods.len() as f64
            }
            _ => 0.0,
        }
    }
}

/// A candidate tariff derived from a [`RateRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tariff {
    pub name: String,
    /// Averaged energy rate in cents per kWh.
    pub rate: f64,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    pub utility: String,
    #[serde(skip)]
    pub external_id: Option<String>,
    /// Raw `energyratestructure` payload, kept for the rate proposal.
    #[serde(skip)]
    pub rate_structure: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Candidates in source order.
    pub candidates: Vec<Tariff>,
    /// Index into `candidates`.
    pub chosen: Option<usize>,
}

impl Selection {
    pub fn chosen(&self) -> Option<&Tariff> {
        self.chosen.and_then(|idx| self.candidates.get(idx))
    }
}

/// Build the candidate list from raw rate items and pick one tariff.
///
/// Items starting in [`LAST_EXCLUDED_YEAR`] or earlier are dropped. Among the rest,
/// the *last* item flagged both approved and default is the most likely tariff.
///
/// Selection order:
/// 1. the candidate whose name equals `requested` exactly;
/// 2. otherwise the most likely tariff;
/// 3. otherwise the first candidate.
///
/// An unmatched `requested` name is not an error: it falls through silently.
/// An empty `requested` counts as absent. Nothing is chosen only when there are
/// no candidates at all.
pub fn select(items: &[Value], requested: Option<&str>) -> Selection {
    let mut candidates = Vec::new();
    let mut most_likely = None;

    for item in items {
        let record = match RateRecord::deserialize(item) {
            Ok(record) => record,
            Err(e) => {
                metrics::counter!("rate_items_malformed_total").increment(1);
                tracing::warn!(error = %e, "skipping malformed rate item");
                continue;
            }
        };

        let start_date = record.start_date();
        if start_date.year() <= LAST_EXCLUDED_YEAR {
            tracing::debug!(name = record.name(), %start_date, "skipping outdated rate item");
            continue;
        }

        if record.is_most_likely() {
            most_likely = Some(candidates.len());
        }

        candidates.push(Tariff {
            name: record.name().to_string(),
            rate: record.average_rate(),
            start_date,
            utility: record.utility().to_string(),
            external_id: record.label.clone(),
            rate_structure: item.get("energyratestructure").cloned().unwrap_or(Value::Array(Vec::new())),
        });
    }

    let requested = requested.filter(|name| !name.is_empty());
    let chosen = requested
        .and_then(|name| candidates.iter().position(|t| t.name == name))
        .or(most_likely)
        .or(if candidates.is_empty() { None } else { Some(0) });

    Selection { candidates, chosen }
}
