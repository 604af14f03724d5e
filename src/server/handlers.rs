use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use super::AppState;
use crate::telemetry::{self};
use crate::telemetry::ops::serve::Phase as ServePhase;

/// GET /api/activity
///
/// Always 200: upstream trouble is reported inside the envelope, never through the status.
pub async fn get_activity(State(state): State<AppState>) -> impl IntoResponse {
    let log = telemetry::serve();
    let request_id = Uuid::new_v4();
    let span = log.span_kv(&ServePhase::Request, [("request_id", request_id.to_string())]);
    span.record("request_id", tracing::field::display(request_id));
    span.record("path", "/api/activity");
    let envelope = state.fetcher.envelope().instrument(span).await;
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Json(envelope),
    )
}

pub async fn health_check() -> (StatusCode, Html<&'static str>) {
    (StatusCode::OK, Html("<h1>live-activity</h1><p>✅ Server is running</p>"))
}
