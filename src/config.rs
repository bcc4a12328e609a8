use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::client::DEFAULT_PORT;
use crate::error::Result;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8050";

/// Upstream port from `DFHACK_PORT`, or the default.
pub fn upstream_port() -> u16 {
    std::env::var("DFHACK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Where the relay listens and which game process it relays for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub listen: String,
    pub upstream: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            listen: DEFAULT_LISTEN.to_string(),
            upstream: format!("localhost:{}", upstream_port()),
        }
    }
}

impl RelayConfig {
    /// Load a JSON config file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}
