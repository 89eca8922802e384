use sqlx::postgres::PgPool;
use tariff_client::{
    db::project_queries,
    domain::{NewProject, NewRateProposal, Project, RateProposal},
};

use crate::pipeline::{ProjectStore, StoreError};

/// [`ProjectStore`] backed by the `projects` and `rate_proposals` tables.
///
/// Writes are attempted once; failures surface to the caller.
#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProjectStore for PgProjectStore {
    async fn record(
        &self,
        project: NewProject,
        proposal: NewRateProposal,
    ) -> Result<(Project, RateProposal), StoreError> {
        project_queries::insert_project_with_proposal(&self.pool, &project, &proposal)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = project.user_id, "failed to record project");
                StoreError::from(e)
            })
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Project>, StoreError> {
        Ok(project_queries::projects_for_user(&self.pool, user_id).await?)
    }
}
