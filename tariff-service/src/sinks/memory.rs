use std::sync::Mutex;

use tariff_client::domain::{NewProject, NewRateProposal, Project, RateProposal};
use time::OffsetDateTime;

use crate::pipeline::{ProjectStore, StoreError};

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    proposals: Vec<RateProposal>,
}

/// In-process [`ProjectStore`] with the same ordering rules as the Postgres one.
#[derive(Default)]
pub struct MemoryProjectStore {
    tables: Mutex<Tables>,
}

impl MemoryProjectStore {
    pub fn proposals(&self) -> Vec<RateProposal> {
        self.tables
            .lock()
            .map(|t| t.proposals.clone())
            .unwrap_or_default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend(anyhow::anyhow!("memory store lock poisoned"))
    }
}

#[async_trait::async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn record(
        &self,
        project: NewProject,
        proposal: NewRateProposal,
    ) -> Result<(Project, RateProposal), StoreError> {
        let mut tables = self.tables.lock().map_err(|_| Self::poisoned())?;

        let project = Project {
            id: tables.projects.len() as i64 + 1,
            user_id: project.user_id,
            address: project.address,
            kwh: project.kwh,
            escalator: project.escalator,
            selected_tariff: project.selected_tariff,
            cost_first_year: project.cost_first_year,
            created_at: OffsetDateTime::now_utc(),
        };
        let proposal = RateProposal {
            id: tables.proposals.len() as i64 + 1,
            project_id: project.id,
            external_id: proposal.external_id,
            tariff_name: proposal.tariff_name,
            rate_structure: proposal.rate_structure,
            utility_name: proposal.utility_name,
        };

        tables.projects.push(project.clone());
        tables.proposals.push(proposal.clone());
        Ok((project, proposal))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables.lock().map_err(|_| Self::poisoned())?;

        let mut projects: Vec<Project> = tables
            .projects
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects)
    }
}
