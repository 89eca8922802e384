//! Token authentication boundary.
//!
//! Tokens are issued, rotated and revoked by the account service; this module only
//! resolves the `Authorization` header of an incoming request to a [`User`].

use std::collections::HashMap;

use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::postgres::PgPool;
use tariff_client::{db::user_queries, domain::User};

use super::{error::ApiError, AppState};
use crate::pipeline::StoreError;

#[async_trait::async_trait]
pub trait TokenResolver: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<Option<User>, StoreError>;
}

pub struct PgTokenResolver {
    pool: PgPool,
}

impl PgTokenResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TokenResolver for PgTokenResolver {
    async fn resolve(&self, key: &str) -> Result<Option<User>, StoreError> {
        Ok(user_queries::user_for_token(&self.pool, key).await?)
    }
}

/// Fixed token table, for local runs and tests.
#[derive(Default)]
pub struct StaticTokenResolver {
    users: HashMap<String, User>,
}

impl StaticTokenResolver {
    pub fn with_token(mut self, key: &str, user: User) -> Self {
        self.users.insert(key.to_string(), user);
        self
    }
}

#[async_trait::async_trait]
impl TokenResolver for StaticTokenResolver {
    async fn resolve(&self, key: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(key).cloned())
    }
}

/// Extract the key from `Token <key>` or `Bearer <key>`.
fn token_key(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty()).then_some(key)
}

/// The authenticated caller. Rejects with 401 when the token is missing or unknown.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(token_key)
            .ok_or(ApiError::Unauthorized)?;

        match state.tokens.resolve(key).await? {
            Some(user) => Ok(Self(user)),
            None => {
                tracing::debug!("unknown API token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
