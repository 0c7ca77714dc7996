mod file_config;

pub use file_config::{EngineFileConfig, FileConfig, ServerFileConfig, TlsFileConfig};

use crate::engine::settings::{
    EngineIdentity, EngineSettings, SessionOptions, TlsMaterial, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_ENGINE_PORT, DEFAULT_RECV_TIMEOUT,
};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER_NAME: &str = "qlik-sense";
pub const DEFAULT_USER_DIRECTORY: &str = "INTERNAL";
pub const DEFAULT_USER_ID: &str = "sa_engine";
pub const DEFAULT_ROOT_CA: &str = "certs/root.pem";
pub const DEFAULT_CLIENT_CERT: &str = "certs/client.pem";
pub const DEFAULT_CLIENT_KEY: &str = "certs/client_key.pem";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub server_url: Option<String>,
    pub port: u16,
    pub user_directory: String,
    pub user_id: String,
    pub root_ca: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub connect_timeout_secs: u64,
    pub recv_timeout_secs: u64,
    pub keep_session_objects: bool,
    pub server_name: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            port: DEFAULT_ENGINE_PORT,
            user_directory: DEFAULT_USER_DIRECTORY.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            root_ca: PathBuf::from(DEFAULT_ROOT_CA),
            client_cert: PathBuf::from(DEFAULT_CLIENT_CERT),
            client_key: PathBuf::from(DEFAULT_CLIENT_KEY),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            recv_timeout_secs: DEFAULT_RECV_TIMEOUT.as_secs(),
            keep_session_objects: false,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub server_name: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let engine_file = file.engine.unwrap_or_default();
        let tls_file = file.tls.unwrap_or_default();
        let server_file = file.server.unwrap_or_default();

        let raw_host = engine_file
            .host
            .or_else(|| cli.server_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "engine host must be specified via --server-url, QLIK_SERVER_URL or in config file"
                )
            })?;
        let host = normalize_host(&raw_host);
        if host.is_empty() {
            bail!("Invalid engine host: {:?}", raw_host);
        }

        let port = engine_file.port.unwrap_or(cli.port);
        let user_directory = engine_file
            .user_directory
            .unwrap_or_else(|| cli.user_directory.clone());
        let user_id = engine_file.user_id.unwrap_or_else(|| cli.user_id.clone());

        let connect_timeout_secs = engine_file
            .connect_timeout_secs
            .unwrap_or(cli.connect_timeout_secs);
        let recv_timeout_secs = engine_file
            .recv_timeout_secs
            .unwrap_or(cli.recv_timeout_secs);
        if connect_timeout_secs == 0 || recv_timeout_secs == 0 {
            bail!("Engine timeouts must be at least one second");
        }
        let destroy_session_objects = engine_file
            .destroy_session_objects
            .unwrap_or(!cli.keep_session_objects);

        let root_ca = tls_file
            .root_ca
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.root_ca.clone());
        let client_cert = tls_file
            .client_cert
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.client_cert.clone());
        let client_key = tls_file
            .client_key
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.client_key.clone());
        require_file(&root_ca, "Root CA certificate")?;
        require_file(&client_cert, "Client certificate")?;
        require_file(&client_key, "Client key")?;

        let server_name = server_file
            .name
            .unwrap_or_else(|| cli.server_name.clone());

        Ok(Self {
            engine: EngineSettings {
                host,
                port,
                identity: EngineIdentity {
                    user_directory,
                    user_id,
                },
                tls: TlsMaterial {
                    root_ca,
                    client_cert,
                    client_key,
                },
                connect_timeout: Duration::from_secs(connect_timeout_secs),
                session: SessionOptions {
                    recv_timeout: Duration::from_secs(recv_timeout_secs),
                    destroy_session_objects,
                },
            },
            server_name,
        })
    }
}

/// Accepts a bare host or a URL and keeps only the host part. A port in the
/// URL is dropped; the engine port always comes from its own setting.
fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let authority = without_scheme.split('/').next().unwrap_or_default();
    strip_port(authority).to_string()
}

fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        // Bracketed IPv6 literal
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port))
            if !host.contains(':')
                && !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            host
        }
        _ => authority,
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file not found: {:?}", what, path);
    }
    if !path.is_file() {
        bail!("{} is not a file: {:?}", what, path);
    }
    Ok(())
}
