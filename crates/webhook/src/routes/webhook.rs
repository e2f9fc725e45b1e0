//! The single webhook endpoint (§4.4): `GET` is a liveness probe, `POST`
//! runs the full dispatch procedure. Every outcome short of a transport
//! failure responds `200 OK` - a rejected signature or an unresolved event
//! is not an error `GitHub` should retry, it is normal operation (§6).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use arc_core::engine::apply_reservation_delta;
use arc_core::resolver::resolve;

use crate::events::parse_event_context;
use crate::signature::verify;
use crate::state::AppState;

pub async fn health() -> &'static str {
    "webhook server is running"
}

pub async fn dispatch(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    match dispatch_inner(&state, &headers, &body).await {
        Ok(message) => (StatusCode::OK, message).into_response(),
        Err(message) => (StatusCode::INTERNAL_SERVER_ERROR, message).into_response(),
    }
}

async fn dispatch_inner(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<String, String> {
    if let Some(secret) = state.webhook_secret() {
        let signature = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify(secret, body, signature) {
            return Err("invalid webhook signature".to_string());
        }
    }

    let event_kind = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if event_kind == "ping" {
        return Ok("pong".to_string());
    }

    let ctx = parse_event_context(&event_kind, body).map_err(|err| err.to_string())?;

    let target = resolve(
        &ctx,
        state.hras(),
        state.workloads(),
        state.platform(),
        state.namespace(),
    )
    .await
    .map_err(|err| err.to_string())?;

    let Some(target) = target else {
        return Ok("no horizontalrunnerautoscaler matched this event".to_string());
    };

    let amount = target.amount.or(ctx.amount_hint).unwrap_or(0);
    let patched = apply_reservation_delta(state.hras(), &target.hra, amount, target.duration)
        .await
        .map_err(|err| err.to_string())?;

    Ok(format!("scaled {} by {}", patched.name, amount))
}
