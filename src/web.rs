//! Router assembly and server loop

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};

/// Serve the AirWatch API on the given port until the process exits.
pub async fn run(port: u16, state: Arc<AppState>) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Web server running at http://localhost:{port}");
    axum::serve(listener, app)
        .await
        .with_context(|| "Server error")?;

    Ok(())
}
