//! # Download Proxy
//!
//! Fetches a remote file server-side and relays it to the caller as a forced
//! download (`Content-Disposition: attachment`). Useful for saving images and
//! files from hosts with hotlink protection or without CORS headers.
//!
//! Two deployment profiles share one handler:
//! - `standalone`: `GET /download?url=...` with CORS headers and an optional
//!   host allowlist
//! - `function`: `GET /api/download?url=...` with neither
//!
//! ## Library usage
//!
//! ```no_run
//! use download_proxy::{DownloadProxy, ProxyConfig, router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProxyConfig::standalone()
//!         .with_allowed_hosts(["nicepng.com", "www.nicepng.com"]);
//!     let app = router(DownloadProxy::new(config)?);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod proxy;
pub mod web;

pub use config::{Profile, ProxyConfig};
pub use proxy::{Download, DownloadProxy, ProxyError, ProxyResult};
pub use web::{router, run_web_server};
