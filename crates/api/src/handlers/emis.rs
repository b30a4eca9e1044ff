use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use campus_core::{
    errors::CampusError,
    models::emis::{CreateEmisDownloadRequest, EmisCategory, EmisDownload},
};
use campus_db::{models::DbEmisDownload, repositories::emis};
use serde::Deserialize;
use std::sync::Arc;

use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct ListDownloadsQuery {
    pub category: Option<EmisCategory>,
}

fn to_download(row: DbEmisDownload) -> Result<EmisDownload, CampusError> {
    Ok(EmisDownload {
        id: row.id,
        title: row.title,
        file_url: row.file_url,
        category: row.category.parse()?,
        created_at: row.created_at,
    })
}

#[axum::debug_handler]
pub async fn list_downloads(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListDownloadsQuery>,
) -> Result<Json<Vec<EmisDownload>>, AppError> {
    let downloads = emis::list_downloads(&state.db_pool, query.category)
        .await?
        .into_iter()
        .map(to_download)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(downloads))
}

#[axum::debug_handler]
pub async fn create_download(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateEmisDownloadRequest>,
) -> Result<(StatusCode, Json<EmisDownload>), AppError> {
    if payload.title.trim().is_empty() || payload.file_url.trim().is_empty() {
        return Err(AppError(CampusError::Validation(
            "Title and file URL are required".to_string(),
        )));
    }

    let row = emis::create_download(&state.db_pool, &payload.title, &payload.file_url, payload.category)
        .await?;

    Ok((StatusCode::CREATED, Json(to_download(row)?)))
}
