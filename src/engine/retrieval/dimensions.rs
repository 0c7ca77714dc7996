use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{list_items, session_object_layout};
use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;

const ID: FieldRule = FieldRule::new(&["/qInfo/qId"]);
const NAME: FieldRule = FieldRule::new(&["/qMeta/title", "/qInfo/qId"]);
const TITLE: FieldRule = FieldRule::new(&["/qData/title", "/qMeta/title"]);
const TAGS: FieldRule = FieldRule::new(&["/qData/tags"]);
const GROUPING: FieldRule = FieldRule::new(&["/qData/grouping"]).skip_empty();
const INFO: FieldRule = FieldRule::new(&["/qData/info"]);
const DESCRIPTION: FieldRule = FieldRule::new(&["/qMeta/description"]);
const CREATED: FieldRule = FieldRule::new(&["/qMeta/createdDate"]);
const MODIFIED: FieldRule = FieldRule::new(&["/qMeta/modifiedDate"]);
const PUBLISHED: FieldRule = FieldRule::new(&["/qMeta/published"]);
const APPROVED: FieldRule = FieldRule::new(&["/qMeta/approved"]);

/// Engine grouping code for a plain, ungrouped dimension.
const NO_GROUPING: &str = "N";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionOptions {
    pub include_title: bool,
    pub include_tags: bool,
    pub include_grouping: bool,
    pub include_info: bool,
}

impl Default for DimensionOptions {
    fn default() -> Self {
        Self {
            include_title: true,
            include_tags: true,
            include_grouping: true,
            include_info: true,
        }
    }
}

/// A master dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRecord {
    pub dimension_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Vec<Value>>,
    pub description: String,
    pub created: String,
    pub modified: String,
    pub published: bool,
    pub approved: bool,
}

fn dimension_list_definition(options: DimensionOptions) -> Value {
    let mut data = Map::new();
    if options.include_title {
        data.insert("title".into(), json!("/title"));
    }
    if options.include_tags {
        data.insert("tags".into(), json!("/tags"));
    }
    if options.include_grouping {
        data.insert("grouping".into(), json!("/qDim/qGrouping"));
    }
    if options.include_info {
        data.insert("info".into(), json!("/qDimInfos"));
    }

    json!({
        "qInfo": {"qType": "DimensionList"},
        "qDimensionListDef": {"qType": "dimension", "qData": data}
    })
}

fn dimension_record(item: &Value, options: DimensionOptions) -> DimensionRecord {
    DimensionRecord {
        dimension_id: ID.string_or(item, ""),
        name: NAME.string_or(item, ""),
        title: options.include_title.then(|| TITLE.string_or(item, "")),
        tags: options.include_tags.then(|| TAGS.strings(item)),
        grouping: options
            .include_grouping
            .then(|| GROUPING.string_or(item, NO_GROUPING)),
        info: options.include_info.then(|| INFO.array(item)),
        description: DESCRIPTION.string_or(item, ""),
        created: CREATED.string_or(item, ""),
        modified: MODIFIED.string_or(item, ""),
        published: PUBLISHED.bool(item),
        approved: APPROVED.bool(item),
    }
}

pub async fn fetch_dimensions(
    conn: &mut Connection,
    options: DimensionOptions,
) -> Result<Vec<DimensionRecord>, EngineError> {
    let layout = session_object_layout(conn, dimension_list_definition(options)).await?;

    let dimensions: Vec<DimensionRecord> = list_items(&layout, "qDimensionList")
        .iter()
        .map(|item| dimension_record(item, options))
        .collect();

    info!("Found {} dimensions", dimensions.len());
    Ok(dimensions)
}
