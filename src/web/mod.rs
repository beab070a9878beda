/*
 * Download Proxy
 * Copyright (C) 2025 Akaere Networks
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

pub mod cors;
pub mod download;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, middleware, response::IntoResponse, routing::get};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::proxy::DownloadProxy;
use download::{download, proxy_health};

/// Builds the router for the proxy's profile.
///
/// The download route comes from the profile; CORS is layered on only when
/// the configuration asks for it.
pub fn router(proxy: DownloadProxy) -> Router {
    let route = proxy.config().profile.route();
    let cors = proxy.config().cors;

    let mut app = Router::new()
        .route(route, get(download))
        .route("/health", get(proxy_health))
        .fallback(not_found)
        .with_state(Arc::new(proxy));

    if cors {
        app = app.layer(middleware::from_fn(cors::cors_middleware));
    }

    app.layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

pub async fn run_web_server(addr: &str, proxy: DownloadProxy) -> Result<()> {
    let route = proxy.config().profile.route();
    let app = router(proxy);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;
    info!(
        "Download proxy running on http://{}{}?url=",
        listener.local_addr()?,
        route
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server terminated unexpectedly")?;

    info!("Download proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
