use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lampsync_http::errors::LampSyncAxumError;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{Outcome, TelemetryHandler},
    registry::DeviceRegistry,
};

/// `GET /healthz` and `POST /messages`, where the request body is one raw queue message.
pub fn router<R: DeviceRegistry + 'static>(handler: Arc<TelemetryHandler<R>>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/messages", post(post_message::<R>))
        .with_state(handler)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn post_message<R: DeviceRegistry + 'static>(
    State(handler): State<Arc<TelemetryHandler<R>>>,
    body: String,
) -> Result<Json<Outcome>, LampSyncAxumError> {
    let outcome = handler.handle(&body).await?;
    Ok(Json(outcome))
}
