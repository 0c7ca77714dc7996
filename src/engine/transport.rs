//! Engine transport.
//!
//! A single WebSocket carrying one JSON-RPC text stream in each direction.
//! The production transport speaks TLS with a client certificate.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use native_tls::{Certificate, Identity, TlsConnector};
use std::path::Path;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::error::EngineError;
use super::settings::{EngineIdentity, EngineSettings, TlsMaterial};

/// Bidirectional text-frame channel to the engine.
#[async_trait]
pub trait EngineTransport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), EngineError>;

    /// Next text frame, or `None` once the engine has closed the stream.
    async fn recv_text(&mut self) -> Result<Option<String>, EngineError>;

    async fn close(&mut self) -> Result<(), EngineError>;
}

pub type EngineStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// tokio-tungstenite transport
pub struct WsTransport {
    stream: EngineStream,
}

impl WsTransport {
    /// Establish the TLS WebSocket described by `settings`, bounded by its
    /// connect timeout.
    pub async fn connect(settings: &EngineSettings) -> Result<Self, EngineError> {
        let endpoint = settings.endpoint();
        info!("Connecting to engine at {}", endpoint);

        let connector = build_tls_connector(&settings.tls).await?;
        let request = build_upgrade_request(&endpoint, &settings.identity)?;

        let connect = connect_async_tls_with_config(
            request,
            None,
            false,
            Some(Connector::NativeTls(connector)),
        );
        let (stream, _) = tokio::time::timeout(settings.connect_timeout, connect)
            .await
            .map_err(|_| {
                EngineError::Connection(format!(
                    "timed out after {:?} connecting to {}",
                    settings.connect_timeout, endpoint
                ))
            })?
            .map_err(|e| EngineError::Connection(format!("WebSocket handshake failed: {}", e)))?;

        info!("Connected to engine");
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already established WebSocket.
    pub fn from_stream(stream: EngineStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl EngineTransport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), EngineError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| EngineError::Transport(format!("send failed: {}", e)))
    }

    async fn recv_text(&mut self) -> Result<Option<String>, EngineError> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_string())),
                Ok(Message::Close(frame)) => {
                    debug!("Engine closed the WebSocket: {:?}", frame);
                    return Ok(None);
                }
                Ok(Message::Binary(_)) => {
                    debug!("Received binary frame, ignoring");
                }
                // Ping is answered by tungstenite
                Ok(_) => {}
                Err(e) => return Err(EngineError::Transport(format!("receive failed: {}", e))),
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| EngineError::Transport(format!("close failed: {}", e)))
    }
}

fn build_upgrade_request(
    endpoint: &str,
    identity: &EngineIdentity,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, EngineError> {
    let mut request = endpoint
        .into_client_request()
        .map_err(|e| EngineError::Connection(format!("invalid endpoint {}: {}", endpoint, e)))?;
    let header = HeaderValue::from_str(&identity.header_value())
        .map_err(|e| EngineError::Connection(format!("invalid identity header: {}", e)))?;
    request
        .headers_mut()
        .insert(EngineIdentity::HEADER_NAME, header);
    Ok(request)
}

/// Trust only the supplied root CA and present the client identity.
/// Hostnames are not checked: engine certificates rarely match the host
/// they are reached through.
async fn build_tls_connector(tls: &TlsMaterial) -> Result<TlsConnector, EngineError> {
    let root_pem = read_pem(&tls.root_ca, "root CA").await?;
    let cert_pem = read_pem(&tls.client_cert, "client certificate").await?;
    let key_pem = read_pem(&tls.client_key, "client key").await?;

    let root = Certificate::from_pem(&root_pem)
        .map_err(|e| EngineError::Connection(format!("invalid root CA: {}", e)))?;
    let identity = Identity::from_pkcs8(&cert_pem, &key_pem)
        .map_err(|e| EngineError::Connection(format!("invalid client certificate/key: {}", e)))?;

    let mut builder = TlsConnector::builder();
    builder
        .add_root_certificate(root)
        .disable_built_in_roots(true)
        .identity(identity)
        .danger_accept_invalid_hostnames(true);
    builder
        .build()
        .map_err(|e| EngineError::Connection(format!("TLS setup failed: {}", e)))
}

async fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, EngineError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| EngineError::Connection(format!("cannot read {} {:?}: {}", what, path, e)))
}
