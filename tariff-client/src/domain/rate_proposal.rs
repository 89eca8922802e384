/// Tariff details stored alongside a [`Project`](super::Project), one per project.
#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RateProposal {
    pub id: i64,
    pub project_id: i64,
    /// Identifier of the tariff in the external rate database; empty when the source had none.
    pub external_id: String,
    pub tariff_name: String,
    /// The tariff's energy rate structure exactly as the source returned it.
    pub rate_structure: serde_json::Value,
    pub utility_name: String,
}

#[derive(Debug, Clone)]
pub struct NewRateProposal {
    pub external_id: String,
    pub tariff_name: String,
    pub rate_structure: serde_json::Value,
    pub utility_name: String,
}
