/// Account owning projects. Registration and token issuance live outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct User {
    pub id: i64,
    pub username: String,
}
