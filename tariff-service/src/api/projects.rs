use axum::{extract::State, Json};
use tariff_client::domain::Project;

use super::{auth::AuthUser, error::ApiError, AppState};

/// `GET /api/projects/`: the caller's projects, newest first.
pub async fn list_projects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.pipeline.store.list_for_user(user.id).await?;
    Ok(Json(projects))
}
