//! Metrics-transport stand-in (§4.1): wraps an outbound call in a `tracing`
//! span recording scope/method/path/status/latency. Real metrics emission is
//! an out-of-scope external collaborator; this preserves the wrapping
//! structure the spec calls for without building a metrics backend.

use std::time::Instant;

use reqwest::{Method, StatusCode};
use tracing::Instrument;

pub async fn instrumented<F, Fut>(
    scope: &str,
    method: &Method,
    path: &str,
    call: F,
) -> reqwest::Result<reqwest::Response>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = reqwest::Result<reqwest::Response>>,
{
    let span = tracing::info_span!(
        "platform_api_call",
        scope = scope,
        method = %method,
        path = path,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );
    let started = Instant::now();

    async move {
        let result = call().await;
        let latency_ms = started.elapsed().as_millis() as u64;
        let status = result
            .as_ref()
            .map(|resp| resp.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::Span::current().record("status", status.as_u16());
        tracing::Span::current().record("latency_ms", latency_ms);
        result
    }
    .instrument(span)
    .await
}
