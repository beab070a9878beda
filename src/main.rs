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

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use download_proxy::config::Cli;
use download_proxy::{DownloadProxy, run_web_server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads PORT / ALLOWED_HOSTS
    let _ = dotenv::dotenv();

    let args = Cli::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = args.resolve()?;
    let proxy_config = &settings.proxy;

    info!("Profile: {:?}", proxy_config.profile);
    if let Some(allowlist) = proxy_config.effective_allowlist() {
        let mut hosts: Vec<_> = allowlist.iter().map(String::as_str).collect();
        hosts.sort_unstable();
        info!("Allowed upstream hosts: {}", hosts.join(", "));
    } else {
        info!("Allowed upstream hosts: any");
    }

    let proxy = DownloadProxy::new(settings.proxy.clone()).context("Failed to create HTTP client")?;
    run_web_server(&settings.addr(), proxy).await
}
