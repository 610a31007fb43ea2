//! caravel.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaravelConfig {
    pub server: Option<ServerConfig>,
    pub gitops: Option<GitopsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub data_dir: Option<String>,
}

/// Branch layout of the cluster configuration repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitopsConfig {
    /// Branch the pipeline writes configuration changes to.
    pub gitops_branch: Option<String>,
    /// Branch the CD backend deploys from.
    pub stable_branch: Option<String>,
}

impl CaravelConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CaravelConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn api_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(8443)
    }

    pub fn data_dir(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .unwrap_or_else(|| "/var/lib/caravel".to_string())
    }
}
