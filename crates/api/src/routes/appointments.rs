use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/appointments",
            post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:reference",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/api/appointments/id/:id/schedule",
            put(handlers::appointments::reschedule_appointment),
        )
        .route(
            "/api/appointments/id/:id/status",
            put(handlers::appointments::update_status),
        )
}
