use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{list_items, session_object_layout};
use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;

const NAME: FieldRule = FieldRule::new(&["/qData/name", "/qName", "/qInfo/qId"]).skip_empty();
const DEFINITION: FieldRule = FieldRule::new(&["/qData/definition", "/qDefinition"]);
const TAGS: FieldRule = FieldRule::new(&["/qData/tags", "/qMeta/tags"]);
const IS_RESERVED: FieldRule = FieldRule::new(&["/qIsReserved", "/qMeta/qIsReserved"]);
const IS_CONFIG: FieldRule = FieldRule::new(&["/qIsConfig", "/qMeta/qIsConfig"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableOptions {
    pub include_definition: bool,
    pub include_tags: bool,
    pub show_reserved: bool,
    pub show_config: bool,
}

impl Default for VariableOptions {
    fn default() -> Self {
        Self {
            include_definition: true,
            include_tags: true,
            show_reserved: true,
            show_config: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub is_reserved: bool,
    pub is_config: bool,
}

fn variable_list_definition(options: VariableOptions) -> Value {
    let mut data = Map::new();
    data.insert("name".into(), json!("/qName"));
    if options.include_definition {
        data.insert("definition".into(), json!("/qDefinition"));
    }
    if options.include_tags {
        data.insert("tags".into(), json!("/tags"));
    }

    json!({
        "qInfo": {"qType": "VariableList"},
        "qVariableListDef": {
            "qType": "variable",
            "qShowReserved": options.show_reserved,
            "qShowConfig": options.show_config,
            "qData": data
        }
    })
}

pub async fn fetch_variables(
    conn: &mut Connection,
    options: VariableOptions,
) -> Result<Vec<VariableRecord>, EngineError> {
    let layout = session_object_layout(conn, variable_list_definition(options)).await?;

    let variables: Vec<VariableRecord> = list_items(&layout, "qVariableList")
        .iter()
        .map(|item| VariableRecord {
            name: NAME.string_or(item, ""),
            definition: options
                .include_definition
                .then(|| DEFINITION.string_or(item, "")),
            tags: options.include_tags.then(|| TAGS.strings(item)),
            is_reserved: IS_RESERVED.bool(item),
            is_config: IS_CONFIG.bool(item),
        })
        .collect();

    info!("Found {} variables", variables.len());
    Ok(variables)
}
