//! Scripted engine double for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::connection::Connection;
use super::error::EngineError;
use super::settings::SessionOptions;
use super::transport::EngineTransport;

/// A request as the engine double saw it.
#[derive(Debug, Clone)]
pub(crate) struct EngineCall {
    pub id: u64,
    pub method: String,
    pub handle: i64,
    pub params: Value,
}

pub(crate) enum Reply {
    Result(Value),
    Error(i64, &'static str),
    /// Never answer; the caller is left waiting.
    Silent,
    /// Emit these frames verbatim.
    Raw(Vec<String>),
    /// Fail the send itself.
    Refuse,
}

type Responder = Box<dyn FnMut(&EngineCall) -> Reply + Send>;

struct State {
    calls: Vec<EngineCall>,
    inbox: VecDeque<String>,
    responder: Responder,
    closed: bool,
}

#[derive(Clone)]
pub(crate) struct ScriptedEngine {
    state: Arc<Mutex<State>>,
}

impl ScriptedEngine {
    pub fn new(responder: impl FnMut(&EngineCall) -> Reply + Send + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                inbox: VecDeque::new(),
                responder: Box::new(responder),
                closed: false,
            })),
        }
    }

    /// Queue a frame before any request is sent, e.g. `OnConnected`.
    pub fn push_frame(&self, frame: impl Into<String>) {
        self.state.lock().unwrap().inbox.push_back(frame.into());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn connection(&self) -> Connection {
        self.connection_with(SessionOptions::default())
    }

    pub fn connection_with(&self, options: SessionOptions) -> Connection {
        Connection::with_transport(
            Box::new(ScriptedTransport {
                state: self.state.clone(),
            }),
            options,
        )
    }
}

struct ScriptedTransport {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl EngineTransport for ScriptedTransport {
    async fn send_text(&mut self, text: String) -> Result<(), EngineError> {
        let request: Value = serde_json::from_str(&text).unwrap();
        let call = EngineCall {
            id: request["id"].as_u64().unwrap(),
            method: request["method"].as_str().unwrap().to_string(),
            handle: request["handle"].as_i64().unwrap(),
            params: request["params"].clone(),
        };
        let mut state = self.state.lock().unwrap();
        let reply = (state.responder)(&call);
        let frames = match reply {
            Reply::Result(result) => vec![result_frame(call.id, result)],
            Reply::Error(code, message) => vec![error_frame(call.id, code, message)],
            Reply::Silent => Vec::new(),
            Reply::Raw(frames) => frames,
            Reply::Refuse => {
                state.calls.push(call);
                return Err(EngineError::Transport("send refused".to_string()));
            }
        };
        state.calls.push(call);
        state.inbox.extend(frames);
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<Option<String>, EngineError> {
        let next = self.state.lock().unwrap().inbox.pop_front();
        match next {
            Some(frame) => Ok(Some(frame)),
            None => {
                futures::future::pending::<()>().await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

pub(crate) fn result_frame(id: u64, result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
}

pub(crate) fn error_frame(id: u64, code: i64, message: &str) -> String {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}).to_string()
}

pub(crate) fn notification_frame(method: &str) -> String {
    json!({"jsonrpc": "2.0", "method": method, "params": {}}).to_string()
}

/// Responder that opens any document with handle 1.
pub(crate) fn open_doc_reply(call: &EngineCall) -> Option<Reply> {
    match call.method.as_str() {
        "OpenDoc" => Some(Reply::Result(
            json!({"qReturn": {"qType": "Doc", "qHandle": 1, "qGenericId": call.params[0]}}),
        )),
        "GetAppLayout" => Some(Reply::Result(json!({"qLayout": {"qTitle": "Sales"}}))),
        _ => None,
    }
}
