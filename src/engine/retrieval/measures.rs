use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{list_items, session_object_layout};
use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;

const ID: FieldRule = FieldRule::new(&["/qData/id", "/qInfo/qId"]);
const TITLE: FieldRule = FieldRule::new(&["/qData/title", "/qMeta/title"]);
const DESCRIPTION: FieldRule = FieldRule::new(&["/qData/description", "/qMeta/description"]);
const EXPRESSION: FieldRule = FieldRule::new(&[
    "/qData/expression",
    "/qData/expression/qDef",
    "/qData/expression/qExpr",
    "/qMeasure/qDef",
])
.skip_empty();
const LABEL: FieldRule = FieldRule::new(&[
    "/qData/label",
    "/qData/label/qExpr",
    "/qMeasure/qLabel",
])
.skip_empty();
const TAGS: FieldRule = FieldRule::new(&["/qData/tags", "/qMeta/tags"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureOptions {
    pub include_expression: bool,
    pub include_tags: bool,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            include_expression: true,
            include_tags: true,
        }
    }
}

/// A master measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

fn measure_list_definition(options: MeasureOptions) -> Value {
    let mut data = Map::new();
    data.insert("title".into(), json!("/qMetaDef/title"));
    data.insert("description".into(), json!("/qMetaDef/description"));
    data.insert("id".into(), json!("/qInfo/qId"));
    if options.include_expression {
        data.insert("expression".into(), json!("/qMeasure/qDef"));
        data.insert("label".into(), json!("/qMeasure/qLabel"));
    }
    if options.include_tags {
        data.insert("tags".into(), json!("/qMetaDef/tags"));
    }

    json!({
        "qInfo": {"qType": "MeasureList"},
        "qMeasureListDef": {"qType": "measure", "qData": data}
    })
}

pub async fn fetch_measures(
    conn: &mut Connection,
    options: MeasureOptions,
) -> Result<Vec<MeasureRecord>, EngineError> {
    let layout = session_object_layout(conn, measure_list_definition(options)).await?;

    let measures: Vec<MeasureRecord> = list_items(&layout, "qMeasureList")
        .iter()
        .map(|item| MeasureRecord {
            id: ID.string_or(item, ""),
            title: TITLE.string_or(item, ""),
            description: DESCRIPTION.string_or(item, ""),
            expression: options
                .include_expression
                .then(|| EXPRESSION.string_or(item, "")),
            label: options.include_expression.then(|| LABEL.string_or(item, "")),
            tags: options.include_tags.then(|| TAGS.strings(item)),
        })
        .collect();

    info!("Found {} measures", measures.len());
    Ok(measures)
}
