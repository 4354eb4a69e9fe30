use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;

/// Counts each request by method and adds its latency to the metrics sink.
pub async fn request_tracker(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    state.metrics.record_request(&method, started.elapsed());
    response
}
