use axum::{
    Json,
    extract::{Path, State},
};
use campus_core::{
    approval::{ApprovalFlags, PublishableKind},
    errors::CampusError,
    models::publishable::{ApprovalResponse, PublishedItem, SetApprovalRequest},
};
use campus_db::repositories::publishable;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

fn parse_kind(slug: &str) -> Result<PublishableKind, AppError> {
    PublishableKind::from_slug(slug)
        .ok_or_else(|| AppError(CampusError::NotFound(format!("No such listing: {}", slug))))
}

#[axum::debug_handler]
pub async fn set_approval(
    State(state): State<Arc<ApiState>>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<SetApprovalRequest>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let kind = parse_kind(&kind)?;

    let approval =
        publishable::set_approval(&state.db_pool, kind, id, payload.gate, payload.approved)
            .await?
            .ok_or_else(|| CampusError::NotFound(format!("{} with ID {} not found", kind, id)))?;

    let flags = ApprovalFlags::new(approval.is_approved_by_department, approval.is_approved_by_campus);
    info!("{} {} is now {:?}", kind, id, flags.state());

    Ok(Json(ApprovalResponse::new(approval.id, kind, flags)))
}

#[axum::debug_handler]
pub async fn get_approval(
    State(state): State<Arc<ApiState>>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let kind = parse_kind(&kind)?;

    let approval = publishable::get_approval(&state.db_pool, kind, id)
        .await?
        .ok_or_else(|| CampusError::NotFound(format!("{} with ID {} not found", kind, id)))?;

    let flags = ApprovalFlags::new(approval.is_approved_by_department, approval.is_approved_by_campus);
    Ok(Json(ApprovalResponse::new(approval.id, kind, flags)))
}

#[axum::debug_handler]
pub async fn list_visible(
    State(state): State<Arc<ApiState>>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<PublishedItem>>, AppError> {
    let kind = parse_kind(&kind)?;

    let items = publishable::list_visible(&state.db_pool, kind)
        .await?
        .into_iter()
        .map(|item| PublishedItem {
            id: item.id,
            kind,
            title: item.title,
            summary: item.summary,
            event_date: item.event_date,
            created_at: item.created_at,
        })
        .collect();

    Ok(Json(items))
}
