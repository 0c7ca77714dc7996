use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub engine: Option<EngineFileConfig>,
    pub tls: Option<TlsFileConfig>,
    pub server: Option<ServerFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EngineFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user_directory: Option<String>,
    pub user_id: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub recv_timeout_secs: Option<u64>,
    pub destroy_session_objects: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TlsFileConfig {
    pub root_ca: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ServerFileConfig {
    pub name: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
