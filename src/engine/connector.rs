//! Per-invocation engine sessions.
//!
//! Every tool call gets its own [`Connection`]. The helpers here open it,
//! hand it to the operation and close it again whatever the outcome.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use super::connection::Connection;
use super::error::EngineError;
use super::settings::EngineSettings;

/// Source of fresh engine connections.
#[async_trait]
pub trait EngineConnector: Send + Sync {
    async fn connect(&self) -> Result<Connection, EngineError>;

    /// Settings the connections are opened with.
    fn settings(&self) -> &EngineSettings;
}

/// Opens TLS WebSocket connections from static settings.
pub struct TlsEngineConnector {
    settings: EngineSettings,
}

impl TlsEngineConnector {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl EngineConnector for TlsEngineConnector {
    async fn connect(&self) -> Result<Connection, EngineError> {
        Connection::open(&self.settings).await
    }

    fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

/// Run `op` against a connection with `document` open.
pub async fn with_document<T, F>(
    connector: &dyn EngineConnector,
    document: &str,
    op: F,
) -> Result<T, EngineError>
where
    F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, EngineError>>,
{
    let mut connection = connector.connect().await?;
    let result = match connection.open_document(document).await {
        Ok(_) => op(&mut connection).await,
        Err(e) => Err(e),
    };
    connection.close().await;
    debug!("Session for document {} finished", document);
    result
}

/// Run `op` against a connection with no document open.
pub async fn with_global<T, F>(connector: &dyn EngineConnector, op: F) -> Result<T, EngineError>
where
    F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, EngineError>>,
{
    let mut connection = connector.connect().await?;
    let result = op(&mut connection).await;
    connection.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::connection::ConnectionState;
    use crate::engine::settings::{EngineIdentity, SessionOptions, TlsMaterial};
    use crate::engine::testing::{open_doc_reply, Reply, ScriptedEngine};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    struct ScriptedConnector {
        engine: ScriptedEngine,
        settings: EngineSettings,
    }

    impl ScriptedConnector {
        fn new(engine: ScriptedEngine) -> Self {
            Self {
                engine,
                settings: EngineSettings {
                    host: "localhost".to_string(),
                    port: 4747,
                    identity: EngineIdentity {
                        user_directory: "INTERNAL".to_string(),
                        user_id: "sa_engine".to_string(),
                    },
                    tls: TlsMaterial {
                        root_ca: PathBuf::from("root.pem"),
                        client_cert: PathBuf::from("client.pem"),
                        client_key: PathBuf::from("client_key.pem"),
                    },
                    connect_timeout: Duration::from_secs(1),
                    session: SessionOptions::default(),
                },
            }
        }
    }

    #[async_trait]
    impl EngineConnector for ScriptedConnector {
        async fn connect(&self) -> Result<Connection, EngineError> {
            Ok(self.engine.connection())
        }

        fn settings(&self) -> &EngineSettings {
            &self.settings
        }
    }

    #[tokio::test]
    async fn test_with_document_closes_after_success() {
        let engine = ScriptedEngine::new(|call| {
            open_doc_reply(call).unwrap_or(Reply::Result(json!({"qScript": "LOAD 1"})))
        });
        let connector = ScriptedConnector::new(engine.clone());

        let state = with_document(&connector, "app-1", |conn| {
            Box::pin(async move { Ok(conn.state()) })
        })
        .await
        .unwrap();

        assert_eq!(state, ConnectionState::DocumentOpen);
        assert!(engine.is_closed());
    }

    #[tokio::test]
    async fn test_with_document_closes_after_failure() {
        let engine = ScriptedEngine::new(|call| {
            open_doc_reply(call).unwrap_or(Reply::Error(-1, "boom"))
        });
        let connector = ScriptedConnector::new(engine.clone());

        let err = with_document(&connector, "app-1", |conn| {
            Box::pin(async move { conn.call("GetScript", 1, json!({})).await.map(|_| ()) })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::Engine { .. }));
        assert!(engine.is_closed());
    }

    #[tokio::test]
    async fn test_with_document_skips_op_when_open_fails() {
        let engine = ScriptedEngine::new(|_| Reply::Result(json!({"qReturn": {}})));
        let connector = ScriptedConnector::new(engine.clone());
        let mut ran = false;

        let result = with_document(&connector, "missing", |_conn| {
            ran = true;
            Box::pin(async move { Ok(()) })
        })
        .await;

        assert!(matches!(result, Err(EngineError::DocumentOpen { .. })));
        assert!(!ran);
        assert!(engine.is_closed());
    }

    #[tokio::test]
    async fn test_with_global_does_not_open_document() {
        let engine = ScriptedEngine::new(|_| Reply::Result(json!({"qDocList": []})));
        let connector = ScriptedConnector::new(engine.clone());

        with_global(&connector, |conn| {
            Box::pin(async move { conn.call("GetDocList", -1, json!({})).await })
        })
        .await
        .unwrap();

        assert_eq!(engine.methods(), vec!["GetDocList"]);
        assert!(engine.is_closed());
    }
}
