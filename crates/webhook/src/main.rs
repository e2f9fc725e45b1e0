//! Webhook dispatcher entry point: receives GitHub webhook deliveries and
//! turns them into capacity-reservation patches (§4.4).

mod config;
mod error;
mod events;
mod routes;
mod signature;
mod state;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::routes::webhook::{dispatch, health};
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arc_webhook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let listen_addr = config.listen_addr;
    let state = AppState::new(&config);

    let app = Router::new()
        .route("/", get(health).post(dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(%listen_addr, "webhook dispatcher listening");
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app).await.expect("server error");
}
