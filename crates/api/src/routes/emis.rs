use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route(
        "/api/emis/downloads",
        get(handlers::emis::list_downloads).post(handlers::emis::create_download),
    )
}
