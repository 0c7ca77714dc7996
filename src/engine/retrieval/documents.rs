use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;
use crate::engine::protocol::{methods, GLOBAL_HANDLE};

const DOC_ID: FieldRule = FieldRule::new(&["/qDocId"]);
const TITLE: FieldRule = FieldRule::new(&["/qTitle", "/qDocName"]).skip_empty();
const LAST_RELOAD: FieldRule = FieldRule::new(&["/qLastReloadTime"]);
const META: FieldRule = FieldRule::new(&["/qMeta"]);
const DOC_TYPE: FieldRule = FieldRule::new(&["/qDocType"]);

/// One entry of the engine's document list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub app_id: String,
    pub name: String,
    pub last_reload_time: String,
    pub meta: Value,
    pub doc_type: String,
}

impl DocumentRecord {
    fn from_item(item: &Value) -> Self {
        Self {
            app_id: DOC_ID.string_or(item, ""),
            name: TITLE.string_or(item, "Untitled"),
            last_reload_time: LAST_RELOAD.string_or(item, ""),
            meta: META.value(item).unwrap_or_else(|| json!({})),
            doc_type: DOC_TYPE.string_or(item, ""),
        }
    }
}

/// Documents visible to the configured identity. Works with or without an
/// open document.
pub async fn list_documents(conn: &mut Connection) -> Result<Vec<DocumentRecord>, EngineError> {
    conn.require_open()?;

    let result = conn
        .call(methods::GET_DOC_LIST, GLOBAL_HANDLE, json!({}))
        .await?;
    let items = match result.get("qDocList") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(_) => {
            return Err(EngineError::unexpected(
                methods::GET_DOC_LIST,
                "qDocList is not an array",
            ))
        }
    };

    let documents: Vec<DocumentRecord> = items.iter().map(DocumentRecord::from_item).collect();
    info!("Found {} documents", documents.len());
    Ok(documents)
}
