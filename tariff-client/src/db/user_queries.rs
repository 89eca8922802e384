use anyhow::Result;
use sqlx::PgPool;

use crate::domain::User;

/// Resolve an API token key to the user it was issued for.
pub async fn user_for_token(pool: &PgPool, key: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT
            u.id,
            u.username
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.key = $1
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
