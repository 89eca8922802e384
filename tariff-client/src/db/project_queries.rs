use anyhow::Result;
use sqlx::PgPool;

use crate::domain::{NewProject, NewRateProposal, Project, RateProposal};

/// Insert a project and its rate proposal in one transaction.
///
/// Either both rows exist afterwards or neither does.
pub async fn insert_project_with_proposal(
    pool: &PgPool,
    project: &NewProject,
    proposal: &NewRateProposal,
) -> Result<(Project, RateProposal)> {
    let mut tx = pool.begin().await?;

    let created = sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (user_id, address, kwh, escalator, selected_tariff, cost_first_year)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING
            id,
            user_id,
            address,
            kwh,
            escalator,
            selected_tariff,
            cost_first_year,
            created_at
        "#,
    )
    .bind(project.user_id)
    .bind(&project.address)
    .bind(project.kwh)
    .bind(project.escalator)
    .bind(&project.selected_tariff)
    .bind(project.cost_first_year)
    .fetch_one(&mut *tx)
    .await?;

    let proposal = sqlx::query_as::<_, RateProposal>(
        r#"
        INSERT INTO rate_proposals (project_id, external_id, tariff_name, rate_structure, utility_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING
            id,
            project_id,
            external_id,
            tariff_name,
            rate_structure,
            utility_name
        "#,
    )
    .bind(created.id)
    .bind(&proposal.external_id)
    .bind(&proposal.tariff_name)
    .bind(&proposal.rate_structure)
    .bind(&proposal.utility_name)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((created, proposal))
}

/// All projects owned by a user, newest first.
pub async fn projects_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, Project>(
        r#"
        SELECT
            id,
            user_id,
            address,
            kwh,
            escalator,
            selected_tariff,
            cost_first_year,
            created_at
        FROM projects
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
