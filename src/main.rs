use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::BufReader;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qlik_mcp_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_CLIENT_CERT, DEFAULT_CLIENT_KEY, DEFAULT_ROOT_CA,
    DEFAULT_SERVER_NAME, DEFAULT_USER_DIRECTORY, DEFAULT_USER_ID,
};
use qlik_mcp_server::engine::{EngineConnector, TlsEngineConnector};
use qlik_mcp_server::mcp::{McpServer, ToolContext};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Error resolving current directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(version, about = "MCP server exposing Qlik Sense engine metadata over stdio")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Engine host name (a URL is accepted, only its host part is used).
    #[clap(long, env = "QLIK_SERVER_URL")]
    pub server_url: Option<String>,

    /// Engine WebSocket port.
    #[clap(long, env = "QLIK_SERVER_PORT", default_value_t = 4747)]
    pub port: u16,

    #[clap(long, env = "QLIK_USER_DIRECTORY", default_value = DEFAULT_USER_DIRECTORY)]
    pub user_directory: String,

    #[clap(long, env = "QLIK_USER_ID", default_value = DEFAULT_USER_ID)]
    pub user_id: String,

    /// Root CA the engine certificate is checked against.
    #[clap(long, env = "QLIK_CERT_ROOT", default_value = DEFAULT_ROOT_CA, value_parser = parse_path)]
    pub cert_root: PathBuf,

    /// Client certificate (PEM).
    #[clap(long, env = "QLIK_CERT_CLIENT", default_value = DEFAULT_CLIENT_CERT, value_parser = parse_path)]
    pub cert_client: PathBuf,

    /// Client private key (PKCS#8 PEM).
    #[clap(long, env = "QLIK_CERT_KEY", default_value = DEFAULT_CLIENT_KEY, value_parser = parse_path)]
    pub cert_key: PathBuf,

    /// Seconds allowed for the TLS WebSocket handshake.
    #[clap(long, env = "WEBSOCKET_TIMEOUT", default_value_t = 30)]
    pub connect_timeout_sec: u64,

    /// Seconds to wait for each engine response.
    #[clap(long, env = "WEBSOCKET_RECV_TIMEOUT", default_value_t = 60)]
    pub recv_timeout_sec: u64,

    /// Leave session objects alive on the engine instead of destroying them after use.
    #[clap(long)]
    pub keep_session_objects: bool,

    /// Name reported in the MCP initialize response.
    #[clap(long, env = "MCP_SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    pub server_name: String,

    /// Version reported in the MCP initialize response.
    #[clap(long, env = "MCP_SERVER_VERSION")]
    pub server_version: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            server_url: self.server_url.clone(),
            port: self.port,
            user_directory: self.user_directory.clone(),
            user_id: self.user_id.clone(),
            root_ca: self.cert_root.clone(),
            client_cert: self.cert_client.clone(),
            client_key: self.cert_key.clone(),
            connect_timeout_secs: self.connect_timeout_sec,
            recv_timeout_secs: self.recv_timeout_sec,
            keep_session_objects: self.keep_session_objects,
            server_name: self.server_name.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // stdout carries the MCP stream, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let server_version = cli_args
        .server_version
        .clone()
        .unwrap_or_else(|| format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")));

    let connector: Arc<dyn EngineConnector> =
        Arc::new(TlsEngineConnector::new(app_config.engine.clone()));
    info!(
        "Engine endpoint {} as {}",
        connector.settings().endpoint(),
        connector.settings().identity.header_value()
    );

    let context = ToolContext {
        connector,
        server_name: app_config.server_name.clone(),
        server_version,
        start_time: Instant::now(),
    };

    info!(
        "Serving MCP server {} over stdio",
        app_config.server_name
    );
    let mut server = McpServer::new(context);
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("MCP stdio loop failed")?;

    info!("MCP client disconnected, shutting down");
    Ok(())
}
