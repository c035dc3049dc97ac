use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::SubscriptionOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the download backend.
    pub api_base: String,
    /// Timeout for the analyze/download request-response calls, seconds.
    /// The progress stream deliberately has no whole-request timeout.
    pub timeout: u64,
    /// Fixed delay between progress-stream reconnect attempts.
    pub reconnect_delay_ms: u64,
    /// Consecutive reconnect attempts before giving up; absent = retry forever.
    pub max_reconnects: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8080".to_string(),
            timeout: 30,
            reconnect_delay_ms: 3000,
            max_reconnects: None,
        }
    }
}

impl Config {
    /// Load from kick-dvr.toml in the working directory, falling back to
    /// defaults when the file is absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("kick-dvr.toml"))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn subscription_options(&self) -> SubscriptionOptions {
        SubscriptionOptions {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            max_reconnects: self.max_reconnects,
            ..SubscriptionOptions::default()
        }
    }
}
