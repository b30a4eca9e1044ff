use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

/// `:kind` is one of `notices`, `department-events` or `global-events`.
pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/:kind", get(handlers::publishing::list_visible))
        .route(
            "/api/:kind/:id/approval",
            get(handlers::publishing::get_approval).put(handlers::publishing::set_approval),
        )
}
