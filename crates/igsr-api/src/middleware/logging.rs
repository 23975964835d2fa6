//! Request logging middleware

use std::time::{Duration, Instant};

use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// Requests slower than this are logged at `warn`
const SLOW_REQUEST: Duration = Duration::from_millis(500);

/// Request logging middleware
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    if elapsed > SLOW_REQUEST {
        tracing::warn!(%method, %uri, ?elapsed, "slow request");
    }

    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        latency_ms = elapsed.as_millis() as u64,
        "request handled"
    );

    response
}
