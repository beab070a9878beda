/*
 * Download Proxy - Download Endpoint
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

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::proxy::{Download, DownloadProxy, ProxyError};

/// Download handler
/// GET <route>?url=<encoded remote url>
pub async fn download(
    State(proxy): State<Arc<DownloadProxy>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = proxy.handle(params.get("url").map(String::as_str)).await;

    match result.and_then(attachment_response) {
        Ok(response) => response,
        Err(e) => {
            if let ProxyError::Internal(_) = e {
                error!("{}", e);
            }
            e.into_response()
        }
    }
}

/// Builds the forced-download response around the still-streaming body
fn attachment_response(download: Download) -> Result<Response, ProxyError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type.as_str())
        .header(header::CONTENT_DISPOSITION, download.content_disposition())
        .header(header::CACHE_CONTROL, "no-store");

    if let Some(len) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    debug!("Streaming {} to client", download.filename);

    builder
        .body(Body::from_stream(download.body))
        .map_err(|e| ProxyError::Internal(e.to_string()))
}

/// Health check endpoint
pub async fn proxy_health() -> Response {
    (StatusCode::OK, "Download Proxy OK").into_response()
}
