use async_trait::async_trait;
use qlik_mcp_server::engine::{
    Connection, EngineConnector, EngineError, EngineIdentity, EngineSettings, EngineTransport,
    SessionOptions, TlsMaterial,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as the mock engine saw it.
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub connection: usize,
    pub id: u64,
    pub method: String,
    pub handle: i64,
    pub params: Value,
}

pub enum MockReply {
    Result(Value),
    Error(i64, String),
    /// Never answer.
    Silent,
    /// Close the stream without answering.
    Hangup,
}

type Responder = Box<dyn Fn(&EngineCall) -> MockReply + Send + Sync>;

struct Shared {
    calls: Vec<EngineCall>,
    connections: usize,
    closed: usize,
}

/// Connector handing out connections to a scripted engine. Every connection
/// starts with an `OnConnected` notification, like the real engine.
#[derive(Clone)]
pub struct MockEngine {
    shared: Arc<Mutex<Shared>>,
    responder: Arc<Responder>,
    settings: EngineSettings,
}

impl MockEngine {
    pub fn new(responder: impl Fn(&EngineCall) -> MockReply + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                calls: Vec::new(),
                connections: 0,
                closed: 0,
            })),
            responder: Arc::new(Box::new(responder)),
            settings: test_settings(),
        }
    }

    pub fn with_session(mut self, session: SessionOptions) -> Self {
        self.settings.session = session;
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn connections_opened(&self) -> usize {
        self.shared.lock().unwrap().connections
    }

    pub fn connections_closed(&self) -> usize {
        self.shared.lock().unwrap().closed
    }
}

#[async_trait]
impl EngineConnector for MockEngine {
    async fn connect(&self) -> Result<Connection, EngineError> {
        let index = {
            let mut shared = self.shared.lock().unwrap();
            shared.connections += 1;
            shared.connections
        };
        let mut inbox = VecDeque::new();
        inbox.push_back(
            json!({
                "jsonrpc": "2.0",
                "method": "OnConnected",
                "params": {"qSessionState": "SESSION_CREATED"}
            })
            .to_string(),
        );
        let transport = MockTransport {
            index,
            inbox,
            hung_up: false,
            shared: self.shared.clone(),
            responder: self.responder.clone(),
        };
        Ok(Connection::with_transport(
            Box::new(transport),
            self.settings.session,
        ))
    }

    fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

struct MockTransport {
    index: usize,
    inbox: VecDeque<String>,
    hung_up: bool,
    shared: Arc<Mutex<Shared>>,
    responder: Arc<Responder>,
}

#[async_trait]
impl EngineTransport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), EngineError> {
        let request: Value = serde_json::from_str(&text).unwrap();
        let call = EngineCall {
            connection: self.index,
            id: request["id"].as_u64().unwrap(),
            method: request["method"].as_str().unwrap().to_string(),
            handle: request["handle"].as_i64().unwrap(),
            params: request["params"].clone(),
        };
        match (self.responder)(&call) {
            MockReply::Result(result) => self.inbox.push_back(
                json!({"jsonrpc": "2.0", "id": call.id, "result": result}).to_string(),
            ),
            MockReply::Error(code, message) => self.inbox.push_back(
                json!({"jsonrpc": "2.0", "id": call.id, "error": {"code": code, "message": message}})
                    .to_string(),
            ),
            MockReply::Silent => {}
            MockReply::Hangup => self.hung_up = true,
        }
        self.shared.lock().unwrap().calls.push(call);
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<Option<String>, EngineError> {
        match self.inbox.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None if self.hung_up => Ok(None),
            None => {
                futures::future::pending::<()>().await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.shared.lock().unwrap().closed += 1;
        Ok(())
    }
}

fn test_settings() -> EngineSettings {
    EngineSettings {
        host: "engine.test".to_string(),
        port: 4747,
        identity: EngineIdentity {
            user_directory: "INTERNAL".to_string(),
            user_id: "sa_engine".to_string(),
        },
        tls: TlsMaterial {
            root_ca: PathBuf::from("certs/root.pem"),
            client_cert: PathBuf::from("certs/client.pem"),
            client_key: PathBuf::from("certs/client_key.pem"),
        },
        connect_timeout: Duration::from_secs(1),
        session: SessionOptions {
            recv_timeout: Duration::from_secs(2),
            destroy_session_objects: true,
        },
    }
}
