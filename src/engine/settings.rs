use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENGINE_PORT: u16 = 4747;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(60);

/// PEM files used for the mutually authenticated TLS session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub root_ca: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

/// Identity presented to the engine in the upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineIdentity {
    pub user_directory: String,
    pub user_id: String,
}

impl EngineIdentity {
    pub const HEADER_NAME: &'static str = "x-qlik-user";

    pub fn header_value(&self) -> String {
        format!(
            "UserDirectory={}; UserId={}",
            self.user_directory, self.user_id
        )
    }
}

/// Per-connection behaviour that does not depend on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub recv_timeout: Duration,
    /// Issue DestroySessionObject for every session list once its layout is read.
    pub destroy_session_objects: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            destroy_session_objects: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub host: String,
    pub port: u16,
    pub identity: EngineIdentity,
    pub tls: TlsMaterial,
    pub connect_timeout: Duration,
    pub session: SessionOptions,
}

impl EngineSettings {
    /// Document-agnostic endpoint; documents are opened over the socket.
    pub fn endpoint(&self) -> String {
        format!("wss://{}:{}/app/", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_header_value() {
        let identity = EngineIdentity {
            user_directory: "INTERNAL".to_string(),
            user_id: "sa_engine".to_string(),
        };
        assert_eq!(
            identity.header_value(),
            "UserDirectory=INTERNAL; UserId=sa_engine"
        );
    }

    #[test]
    fn test_endpoint() {
        let settings = EngineSettings {
            host: "qlik.example.com".to_string(),
            port: DEFAULT_ENGINE_PORT,
            identity: EngineIdentity {
                user_directory: "INTERNAL".to_string(),
                user_id: "sa_engine".to_string(),
            },
            tls: TlsMaterial {
                root_ca: PathBuf::from("certs/root.pem"),
                client_cert: PathBuf::from("certs/client.pem"),
                client_key: PathBuf::from("certs/client_key.pem"),
            },
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            session: SessionOptions::default(),
        };
        assert_eq!(settings.endpoint(), "wss://qlik.example.com:4747/app/");
    }
}
