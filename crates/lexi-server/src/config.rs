//! Server configuration, loaded from environment variables at startup.

use std::fmt;

use lexi_types::config::ProxyConfig;

/// Runtime configuration for lexi-server.
///
/// Every field has a default so the server starts without any environment
/// variables set. Without a credential it still starts, but every chat
/// request fails.
#[derive(Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Bearer credential for the hosted model (`GITHUB_TOKEN`).
    pub api_key: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Model, preamble, deadline and pacing of the proxy.
    pub proxy: ProxyConfig,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let mut proxy = ProxyConfig::default();
        proxy.api_base = env_or("LEXI_API_BASE", &proxy.api_base);

        Self {
            bind_address: env_or("LEXI_BIND", "0.0.0.0:3000"),
            api_key: lookup("GITHUB_TOKEN").filter(|k| !k.trim().is_empty()),
            log_level: env_or("LEXI_LOG", "info"),
            log_json: lookup("LEXI_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            proxy,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("proxy", &self.proxy)
            .finish()
    }
}
