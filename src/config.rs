use std::time::Duration;

use clap::Args;

pub const DEFAULT_API_BASE: &str = "https://adam-jerusalem.nd.edu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Base URL of the platform API
    #[arg(long, global = true, env = "PROFILE_API_URL", default_value = DEFAULT_API_BASE)]
    pub api_url: String,
    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "PROFILE_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ApiArgs {
    pub fn into_config(self) -> anyhow::Result<Config> {
        let api_base = self.api_url.trim().trim_end_matches('/').to_string();
        anyhow::ensure!(!api_base.is_empty(), "PROFILE_API_URL must not be empty");
        anyhow::ensure!(self.timeout_secs > 0, "timeout must be at least one second");

        Ok(Config {
            api_base,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}
