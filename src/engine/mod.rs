//! Analytics engine client.
//!
//! Everything needed to talk to the engine over its JSON-RPC WebSocket API:
//! wire types, the transport, the per-invocation session and the retrieval
//! procedures built on top of it.

pub mod connection;
pub mod connector;
pub mod error;
pub mod extract;
pub mod protocol;
pub mod retrieval;
pub mod settings;
pub mod transport;

#[cfg(test)]
mod testing;

pub use connection::{Connection, ConnectionState};
pub use connector::{with_document, with_global, EngineConnector, TlsEngineConnector};
pub use error::{DocumentOpenFailure, EngineError};
pub use settings::{EngineIdentity, EngineSettings, SessionOptions, TlsMaterial};
pub use transport::{EngineTransport, WsTransport};
