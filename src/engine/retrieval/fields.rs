use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::info;

use super::{list_items, session_object_layout};
use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;

const NAME: FieldRule = FieldRule::new(&["/qName"]);
const IS_SYSTEM: FieldRule = FieldRule::new(&["/qIsSystem"]);
const IS_HIDDEN: FieldRule = FieldRule::new(&["/qIsHidden"]);
const IS_SEMANTIC: FieldRule = FieldRule::new(&["/qIsSemantic"]);
const IS_NUMERIC: FieldRule = FieldRule::new(&["/qIsNumeric"]);
const CARDINAL: FieldRule = FieldRule::new(&["/qCardinal"]);
const SRC_TABLES: FieldRule = FieldRule::new(&["/qSrcTables"]);
const TAGS: FieldRule = FieldRule::new(&["/qTags"]);
const AND_MODE: FieldRule = FieldRule::new(&["/qAndMode"]);

/// The six `qShow*` switches of a field list definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    pub show_system: bool,
    pub show_hidden: bool,
    pub show_derived_fields: bool,
    pub show_semantic: bool,
    pub show_src_tables: bool,
    pub show_implicit: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            show_system: true,
            show_hidden: true,
            show_derived_fields: true,
            show_semantic: true,
            show_src_tables: true,
            show_implicit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRecord {
    pub name: String,
    pub is_system: bool,
    pub is_hidden: bool,
    pub is_semantic: bool,
    pub is_numeric: bool,
    pub cardinal: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_tables: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and_mode: Option<bool>,
}

/// Fields of a document together with the tables they come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCatalog {
    pub fields: Vec<FieldRecord>,
    /// Distinct source tables, sorted.
    pub tables: Vec<String>,
}

fn field_list_definition(options: FieldOptions) -> Value {
    json!({
        "qInfo": {"qType": "FieldList"},
        "qFieldListDef": {
            "qShowSystem": options.show_system,
            "qShowHidden": options.show_hidden,
            "qShowDerivedFields": options.show_derived_fields,
            "qShowSemantic": options.show_semantic,
            "qShowSrcTables": options.show_src_tables,
            "qShowImplicit": options.show_implicit
        }
    })
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

fn field_record(item: &Value) -> FieldRecord {
    FieldRecord {
        name: NAME.string_or(item, ""),
        is_system: IS_SYSTEM.bool(item),
        is_hidden: IS_HIDDEN.bool(item),
        is_semantic: IS_SEMANTIC.bool(item),
        is_numeric: IS_NUMERIC.bool(item),
        cardinal: CARDINAL.number(item).max(0.0) as u64,
        source_tables: non_empty(SRC_TABLES.strings(item)),
        tags: non_empty(TAGS.strings(item)),
        and_mode: AND_MODE.value(item).and_then(|v| v.as_bool()),
    }
}

pub async fn fetch_fields(
    conn: &mut Connection,
    options: FieldOptions,
) -> Result<FieldCatalog, EngineError> {
    let layout = session_object_layout(conn, field_list_definition(options)).await?;

    let fields: Vec<FieldRecord> = list_items(&layout, "qFieldList")
        .iter()
        .map(field_record)
        .collect();
    let tables: BTreeSet<&str> = fields
        .iter()
        .flat_map(|f| f.source_tables.iter().flatten())
        .map(String::as_str)
        .collect();
    let tables: Vec<String> = tables.into_iter().map(str::to_string).collect();

    info!("Found {} fields across {} tables", fields.len(), tables.len());
    Ok(FieldCatalog { fields, tables })
}
