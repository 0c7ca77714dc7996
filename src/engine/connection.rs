//! Engine session client.
//!
//! A [`Connection`] owns one transport and runs one call at a time: the
//! request is sent, then frames are read until the response carrying the
//! same id arrives. Notifications seen while waiting are dropped.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::{DocumentOpenFailure, EngineError};
use super::protocol::{methods, parse_frame, EngineRequest, InboundFrame, GLOBAL_HANDLE};
use super::settings::{EngineSettings, SessionOptions};
use super::transport::{EngineTransport, WsTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connected,
    DocumentOpen,
}

pub struct Connection {
    transport: Option<Box<dyn EngineTransport>>,
    /// Id of the most recent request; the first call is issued with id 1.
    last_request_id: u64,
    document_handle: Option<i64>,
    options: SessionOptions,
}

impl Connection {
    /// Connect to the engine root. No document is open afterwards.
    pub async fn open(settings: &EngineSettings) -> Result<Self, EngineError> {
        let transport = WsTransport::connect(settings).await?;
        Ok(Self::with_transport(Box::new(transport), settings.session))
    }

    pub fn with_transport(transport: Box<dyn EngineTransport>, options: SessionOptions) -> Self {
        Self {
            transport: Some(transport),
            last_request_id: 0,
            document_handle: None,
            options,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match (&self.transport, self.document_handle) {
            (None, _) => ConnectionState::Closed,
            (Some(_), None) => ConnectionState::Connected,
            (Some(_), Some(_)) => ConnectionState::DocumentOpen,
        }
    }

    pub fn document_handle(&self) -> Option<i64> {
        self.document_handle
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Handle of the open document, checked locally without touching the wire.
    pub fn require_document(&self) -> Result<i64, EngineError> {
        match (&self.transport, self.document_handle) {
            (Some(_), Some(handle)) => Ok(handle),
            _ => Err(EngineError::NotConnected),
        }
    }

    pub fn require_open(&self) -> Result<(), EngineError> {
        match self.state() {
            ConnectionState::Closed => Err(EngineError::Closed),
            _ => Ok(()),
        }
    }

    /// Execute one remote procedure and return its `result`.
    ///
    /// Fatal failures (transport, timeout, protocol) close the connection
    /// before they are returned, so a late response can never be mistaken
    /// for the answer to a later call.
    pub async fn call(
        &mut self,
        method: &str,
        handle: i64,
        params: Value,
    ) -> Result<Value, EngineError> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(EngineError::Closed);
        };

        self.last_request_id += 1;
        let id = self.last_request_id;
        debug!("-> #{} {} (handle {})", id, method, handle);

        let recv_timeout = self.options.recv_timeout;
        let request = EngineRequest::new(id, method, handle, params);
        let outcome = match tokio::time::timeout(
            recv_timeout,
            exchange(&mut **transport, &request),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(EngineError::Timeout {
                method: method.to_string(),
                timeout: recv_timeout,
            }),
        };

        if let Err(err) = &outcome {
            if err.is_fatal() {
                warn!("{} #{} failed, closing connection: {}", method, id, err);
                self.close().await;
            } else {
                debug!("<- #{} {} failed: {}", id, method, err);
            }
        }
        outcome
    }

    /// Open `document` and verify it by fetching its layout.
    ///
    /// If a document was already open and the new one cannot be opened, the
    /// connection is closed rather than left without a document.
    pub async fn open_document(&mut self, document: &str) -> Result<i64, EngineError> {
        let previous = self.document_handle.take();

        match self.open_and_verify(document).await {
            Ok(handle) => {
                self.document_handle = Some(handle);
                Ok(handle)
            }
            Err(e) => {
                if previous.is_some() && self.transport.is_some() {
                    warn!("Re-opening as {} failed, closing connection: {}", document, e);
                    self.close().await;
                }
                Err(e)
            }
        }
    }

    async fn open_and_verify(&mut self, document: &str) -> Result<i64, EngineError> {
        let opened = self
            .call(methods::OPEN_DOC, GLOBAL_HANDLE, json!([document]))
            .await?;
        let handle = opened
            .pointer("/qReturn/qHandle")
            .and_then(Value::as_i64)
            .ok_or_else(|| EngineError::DocumentOpen {
                document: document.to_string(),
                reason: DocumentOpenFailure::NoHandle,
            })?;

        let layout = match self.call(methods::GET_APP_LAYOUT, handle, json!({})).await {
            Ok(layout) => layout,
            Err(EngineError::Engine { code, message }) => {
                return Err(EngineError::DocumentOpen {
                    document: document.to_string(),
                    reason: DocumentOpenFailure::VerificationFailed(format!(
                        "engine error {}: {}",
                        code, message
                    )),
                })
            }
            Err(e) => return Err(e),
        };
        if is_empty_result(&layout) {
            return Err(EngineError::DocumentOpen {
                document: document.to_string(),
                reason: DocumentOpenFailure::VerificationFailed("empty layout".to_string()),
            });
        }

        let title = layout
            .pointer("/qLayout/qTitle")
            .or_else(|| layout.get("qTitle"))
            .and_then(Value::as_str)
            .unwrap_or(document);
        info!("Opened document {} with handle {}", title, handle);
        Ok(handle)
    }

    /// Release the transport. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.document_handle = None;
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                debug!("Error while closing engine transport: {}", e);
            }
            debug!("Engine connection closed");
        }
    }

    pub fn recv_timeout(&self) -> Duration {
        self.options.recv_timeout
    }
}

/// Send one request and wait for its response.
async fn exchange(
    transport: &mut dyn EngineTransport,
    request: &EngineRequest<'_>,
) -> Result<Value, EngineError> {
    let frame = serde_json::to_string(request)
        .map_err(|e| EngineError::Protocol(format!("cannot encode request: {}", e)))?;
    transport.send_text(frame).await?;
    await_response(transport, request.id).await
}

async fn await_response(
    transport: &mut dyn EngineTransport,
    id: u64,
) -> Result<Value, EngineError> {
    loop {
        let Some(text) = transport.recv_text().await? else {
            return Err(EngineError::Transport(
                "engine closed the connection while a call was pending".to_string(),
            ));
        };

        match parse_frame(&text)? {
            InboundFrame::Notification { method } => {
                debug!("Skipping engine notification {}", method);
            }
            InboundFrame::Response {
                id: response_id,
                outcome,
            } => {
                if response_id != id {
                    return Err(EngineError::Protocol(format!(
                        "received response #{} while waiting for #{}",
                        response_id, id
                    )));
                }
                debug!("<- #{}", id);
                return outcome.map_err(EngineError::from);
            }
        }
    }
}

fn is_empty_result(value: &Value) -> bool {
    if let Some(layout) = value.get("qLayout") {
        return is_empty_result(layout);
    }
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
