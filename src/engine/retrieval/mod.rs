//! Object retrieval procedures.
//!
//! Each procedure is a fixed sequence of calls against a connection that
//! already has a document open, followed by reshaping the engine layout
//! into typed records.

mod dimensions;
mod documents;
mod fields;
mod lineage;
mod measures;
mod script;
mod sheet_objects;
mod sheets;
mod variables;

pub use dimensions::{fetch_dimensions, DimensionOptions, DimensionRecord};
pub use documents::{list_documents, DocumentRecord};
pub use fields::{fetch_fields, FieldCatalog, FieldOptions, FieldRecord};
pub use lineage::{
    classify_source, fetch_lineage, DataSource, LineageOptions, LineageReport, SourceKind,
};
pub use measures::{fetch_measures, MeasureOptions, MeasureRecord};
pub use script::{fetch_script, ScriptRecord};
pub use sheet_objects::{
    fetch_sheet_objects, DimensionDef, MeasureDef, ObjectPlacement, ObjectProperties,
    SheetObjectOptions, SheetObjectRecord, SheetObjects,
};
pub use sheets::{fetch_sheets, SheetOptions, SheetRecord};
pub use variables::{fetch_variables, VariableOptions, VariableRecord};

use serde_json::{json, Value};
use std::future::Future;
use tracing::{debug, warn};

use super::connection::{Connection, ConnectionState};
use super::error::EngineError;
use super::extract::{object_handle, unwrap_layout};
use super::protocol::methods;

/// Result of retrieving one item of an enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    Retrieved(T),
    /// The item could not be fetched; `record` is a minimal placeholder.
    Degraded { record: T, reason: String },
}

impl<T> ItemOutcome<T> {
    /// Turn a per-item result into an outcome; any error degrades the item.
    pub fn from_result(result: Result<T, EngineError>, placeholder: impl FnOnce() -> T) -> Self {
        match result {
            Ok(record) => ItemOutcome::Retrieved(record),
            Err(e) => ItemOutcome::Degraded {
                record: placeholder(),
                reason: e.to_string(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ItemOutcome::Degraded { .. })
    }

    pub fn into_record(self) -> T {
        match self {
            ItemOutcome::Retrieved(record) => record,
            ItemOutcome::Degraded { record, .. } => record,
        }
    }
}

/// Per-item bookkeeping for an enumeration over one connection. After a
/// fatal error has closed the connection, the remaining items are degraded
/// with that error instead of being fetched.
#[derive(Debug, Default)]
pub(crate) struct ItemCollector {
    fatal: Option<String>,
}

impl ItemCollector {
    pub(crate) async fn collect<T, F>(
        &mut self,
        fetch: F,
        placeholder: impl FnOnce() -> T,
    ) -> ItemOutcome<T>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        if let Some(reason) = &self.fatal {
            return ItemOutcome::Degraded {
                record: placeholder(),
                reason: reason.clone(),
            };
        }

        let result = fetch.await;
        if let Err(e) = &result {
            if e.is_fatal() {
                warn!("Connection lost mid-enumeration, degrading remaining items: {}", e);
                self.fatal = Some(e.to_string());
            }
        }
        ItemOutcome::from_result(result, placeholder)
    }
}

/// Create a session object from `definition`, read its layout and, when
/// enabled, destroy it again. Returns the unwrapped layout.
pub(crate) async fn session_object_layout(
    conn: &mut Connection,
    definition: Value,
) -> Result<Value, EngineError> {
    let document = conn.require_document()?;

    let created = conn
        .call(methods::CREATE_SESSION_OBJECT, document, json!([definition]))
        .await?;
    let handle = object_handle(&created, methods::CREATE_SESSION_OBJECT)?;
    let layout = conn.call(methods::GET_LAYOUT, handle, json!({})).await;

    if conn.options().destroy_session_objects && conn.state() != ConnectionState::Closed {
        match created.pointer("/qReturn/qGenericId").and_then(Value::as_str) {
            Some(id) => {
                if let Err(e) = conn
                    .call(methods::DESTROY_SESSION_OBJECT, document, json!([id]))
                    .await
                {
                    warn!("Failed to destroy session object {}: {}", id, e);
                } else {
                    debug!("Destroyed session object {}", id);
                }
            }
            None => debug!("Session object has no generic id, not destroying it"),
        }
    }

    Ok(unwrap_layout(&layout?).clone())
}

/// `GetObject` followed by `GetLayout` for a persistent object.
pub(crate) async fn object_layout(
    conn: &mut Connection,
    object_id: &str,
) -> Result<Value, EngineError> {
    let document = conn.require_document()?;
    let object = conn
        .call(methods::GET_OBJECT, document, json!([object_id]))
        .await?;
    let handle = object_handle(&object, methods::GET_OBJECT)?;
    let layout = conn.call(methods::GET_LAYOUT, handle, json!({})).await?;
    Ok(unwrap_layout(&layout).clone())
}

/// `qItems` of the list under `list_key` in a session list layout.
pub(crate) fn list_items<'a>(layout: &'a Value, list_key: &str) -> &'a [Value] {
    layout
        .get(list_key)
        .and_then(|list| list.get("qItems"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
