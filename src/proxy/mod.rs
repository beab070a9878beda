/*
 * Download Proxy - Upstream Fetcher
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

//! Request handling shared by every deployment profile.
//!
//! [`DownloadProxy::handle`] runs one linear pipeline per request: validate
//! the target, check the allowlist, fetch upstream with a same-origin
//! Referer, then hand back a [`Download`] whose body is still streaming.

pub mod body;
pub mod error;
pub mod filename;
pub mod request;

use reqwest::{Client, header, redirect};
use tracing::{debug, warn};

use crate::config::{MAX_REDIRECTS, ProxyConfig};
pub use body::{BodyError, ByteStream};
pub use error::{ProxyError, ProxyResult};
pub use filename::{filename_from_url, sanitize_filename};
pub use request::DownloadRequest;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An upstream file ready to be relayed
pub struct Download {
    pub content_type: String,
    pub filename: String,
    /// Forwarded when the upstream declares it
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl Download {
    /// `Content-Disposition` value forcing a file download
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// The proxy handler, cheap to share behind an `Arc`
#[derive(Debug, Clone)]
pub struct DownloadProxy {
    client: Client,
    config: ProxyConfig,
}

impl DownloadProxy {
    pub fn new(config: ProxyConfig) -> ProxyResult<Self> {
        // Keep the same-host Referer on every redirect hop
        let mut builder = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .referer(false);
        if let Some(timeout) = config.timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Proxies `raw_url`, the undecoded value of the `url` query parameter
    pub async fn handle(&self, raw_url: Option<&str>) -> ProxyResult<Download> {
        let request = DownloadRequest::parse(raw_url).inspect_err(|e| {
            debug!("Rejected download request {:?}: {}", raw_url, e);
        })?;

        if let Some(allowlist) = self.config.effective_allowlist() {
            request.check_allowed(allowlist).inspect_err(|_| {
                debug!("Host {} is not in the allowlist", request.source_host);
            })?;
        }

        self.fetch(&request).await
    }

    async fn fetch(&self, request: &DownloadRequest) -> ProxyResult<Download> {
        debug!("Proxying download from: {}", request.target_url);

        let send = self
            .client
            .get(request.target_url.clone())
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::REFERER, request.referer())
            .send();

        let response = match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, send).await.map_err(|_| {
                ProxyError::Internal(format!(
                    "upstream did not respond within {}s",
                    timeout.as_secs()
                ))
            })??,
            None => send.await?,
        };

        let status = response.status();
        debug!("Upstream response status: {}", status);

        if !status.is_success() {
            warn!("Upstream {} returned non-success status: {}", request.source_host, status);
            return Err(ProxyError::Upstream(status.as_u16()));
        }

        let content_length = response.content_length();
        let max = self.config.max_body_bytes;
        if max > 0 && content_length.is_some_and(|len| len > max) {
            warn!(
                "Upstream {} declared {} bytes, over the {} byte cap",
                request.source_host,
                content_length.unwrap_or_default(),
                max
            );
            return Err(ProxyError::UpstreamTooLarge);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let filename = filename_from_url(&request.target_url);
        debug!("Relaying {} as {} ({})", request.target_url, filename, content_type);

        Ok(Download {
            content_type,
            filename,
            content_length,
            body: body::limit_body(response.bytes_stream(), max),
        })
    }
}
