use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::protocol::methods;

/// Load script of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptRecord {
    pub script: String,
    /// Length in characters.
    pub script_length: usize,
}

pub async fn fetch_script(conn: &mut Connection) -> Result<ScriptRecord, EngineError> {
    let document = conn.require_document()?;
    let result = conn.call(methods::GET_SCRIPT, document, json!({})).await?;

    let script = match result.get("qScript") {
        Some(Value::String(script)) => script.clone(),
        Some(Value::Null) | None => String::new(),
        Some(_) => {
            return Err(EngineError::unexpected(
                methods::GET_SCRIPT,
                "qScript is not a string",
            ))
        }
    };
    let script_length = script.chars().count();

    info!("Retrieved script ({} characters)", script_length);
    Ok(ScriptRecord {
        script,
        script_length,
    })
}
