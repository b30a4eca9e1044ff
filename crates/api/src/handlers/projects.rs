use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use campus_core::{
    errors::CampusError,
    models::project::{CreateProjectRequest, Project},
};
use campus_db::{models::DbProject, repositories::project};
use std::sync::Arc;

use crate::{ApiState, middleware::error_handling::AppError};

fn to_project(row: DbProject) -> Project {
    Project {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
        created_at: row.created_at,
    }
}

#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = project::list_projects(&state.db_pool)
        .await?
        .into_iter()
        .map(to_project)
        .collect();

    Ok(Json(projects))
}

#[axum::debug_handler]
pub async fn create_project(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError(CampusError::Validation("Title is required".to_string())));
    }

    let row = project::create_project(&state.db_pool, &payload).await?;

    Ok((StatusCode::CREATED, Json(to_project(row))))
}

#[axum::debug_handler]
pub async fn get_project(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, AppError> {
    let row = project::get_project_by_slug(&state.db_pool, &slug)
        .await?
        .ok_or_else(|| CampusError::NotFound(format!("Project {} not found", slug)))?;

    Ok(Json(to_project(row)))
}
