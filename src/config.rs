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

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

// Listener defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

// Upstream request defaults
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;
pub const MAX_REDIRECTS: usize = 10;

// Route of each deployment profile
pub const STANDALONE_ROUTE: &str = "/download";
pub const FUNCTION_ROUTE: &str = "/api/download";

/// Deployment profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// `/download` with CORS headers and the host allowlist
    #[default]
    Standalone,
    /// `/api/download` without CORS or allowlist
    Function,
}

impl Profile {
    pub fn route(self) -> &'static str {
        match self {
            Profile::Standalone => STANDALONE_ROUTE,
            Profile::Function => FUNCTION_ROUTE,
        }
    }
}

/// Everything the proxy handler and router need, passed in at construction
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub profile: Profile,
    /// Attach CORS headers and answer `OPTIONS` with 204
    pub cors: bool,
    /// Apply `allowed_hosts`; an empty set allows every host
    pub enforce_allowlist: bool,
    /// Lowercase hostnames
    pub allowed_hosts: HashSet<String>,
    pub user_agent: String,
    /// Applies to connecting and to waiting for response headers, `None` disables it
    pub timeout: Option<Duration>,
    /// 0 disables the cap
    pub max_body_bytes: u64,
}

impl ProxyConfig {
    /// Defaults for the given profile
    pub fn for_profile(profile: Profile) -> Self {
        let layered = profile == Profile::Standalone;
        Self {
            profile,
            cors: layered,
            enforce_allowlist: layered,
            allowed_hosts: HashSet::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn standalone() -> Self {
        Self::for_profile(Profile::Standalone)
    }

    pub fn function() -> Self {
        Self::for_profile(Profile::Function)
    }

    /// Replaces the allowlist, normalizing entries to lowercase
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_hosts = normalize_hosts(hosts);
        self
    }

    /// Hosts the handler checks against, empty when the gate is off
    pub fn effective_allowlist(&self) -> Option<&HashSet<String>> {
        (self.enforce_allowlist && !self.allowed_hosts.is_empty()).then_some(&self.allowed_hosts)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::standalone()
    }
}

fn normalize_hosts<I, S>(hosts: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    hosts
        .into_iter()
        .map(|h| h.as_ref().trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Optional TOML configuration file, every key may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub profile: Option<Profile>,
    pub cors: Option<bool>,
    pub enforce_allowlist: Option<bool>,
    pub allowed_hosts: Vec<String>,
    pub user_agent: Option<String>,
    pub timeout: Option<u64>,
    pub max_body_bytes: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "A forced-download HTTP proxy")]
pub struct Cli {
    /// Listen address
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Deployment profile
    #[arg(long, value_enum, env = "PROXY_PROFILE")]
    pub profile: Option<Profile>,

    /// Trusted upstream host, repeat or comma-separate for several
    #[arg(long = "allow-host", env = "ALLOWED_HOSTS", value_delimiter = ',')]
    pub allow_hosts: Vec<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Upstream connect and response-header timeout in seconds, 0 disables it
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Largest upstream body relayed, 0 disables the cap
    #[arg(long)]
    pub max_body_bytes: Option<u64>,

    /// User-Agent sent upstream
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Enable trace output (extremely verbose)
    #[arg(short, long)]
    pub trace: bool,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub proxy: ProxyConfig,
}

impl Settings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Cli {
    /// Merges command line, config file and defaults, in that order of precedence
    pub fn resolve(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(self.merge(file))
    }

    fn merge(&self, file: FileConfig) -> Settings {
        let profile = self.profile.or(file.profile).unwrap_or_default();
        let mut proxy = ProxyConfig::for_profile(profile);

        if let Some(cors) = file.cors {
            proxy.cors = cors;
        }
        if let Some(enforce) = file.enforce_allowlist {
            proxy.enforce_allowlist = enforce;
        }

        proxy = if self.allow_hosts.is_empty() {
            proxy.with_allowed_hosts(&file.allowed_hosts)
        } else {
            proxy.with_allowed_hosts(&self.allow_hosts)
        };

        if let Some(agent) = self.user_agent.clone().or(file.user_agent) {
            proxy.user_agent = agent;
        }
        if let Some(secs) = self.timeout.or(file.timeout) {
            proxy.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(max) = self.max_body_bytes.or(file.max_body_bytes) {
            proxy.max_body_bytes = max;
        }

        Settings {
            host: self
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.or(file.port).unwrap_or(DEFAULT_PORT),
            proxy,
        }
    }
}
