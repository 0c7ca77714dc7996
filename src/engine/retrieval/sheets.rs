use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{object_layout, ItemCollector, ItemOutcome};
use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;
use crate::engine::protocol::methods;

const TITLE: FieldRule = FieldRule::new(&["/qMeta/title"]);
const DESCRIPTION: FieldRule = FieldRule::new(&["/qMeta/description"]);
const RANK: FieldRule = FieldRule::new(&["/rank"]);
const THUMBNAIL: FieldRule = FieldRule::new(&["/qMeta/thumbnail", "/thumbnail"]);
const CREATED: FieldRule = FieldRule::new(&["/qMeta/createdDate"]);
const MODIFIED: FieldRule = FieldRule::new(&["/qMeta/modifiedDate"]);
const PUBLISHED: FieldRule = FieldRule::new(&["/qMeta/published"]);
const APPROVED: FieldRule = FieldRule::new(&["/qMeta/approved"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetOptions {
    pub include_thumbnail: bool,
    pub include_metadata: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            include_thumbnail: false,
            include_metadata: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRecord {
    pub sheet_id: String,
    pub title: String,
    pub description: String,
    pub rank: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

impl SheetRecord {
    /// Stand-in for a sheet whose layout could not be read.
    fn placeholder(sheet_id: &str) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            title: sheet_id.to_string(),
            description: String::new(),
            rank: 0.0,
            thumbnail: None,
            created: None,
            modified: None,
            published: None,
            approved: None,
        }
    }

    fn from_layout(sheet_id: &str, layout: &Value, options: SheetOptions) -> Self {
        let metadata = options.include_metadata;
        Self {
            sheet_id: sheet_id.to_string(),
            title: TITLE.string_or(layout, ""),
            description: DESCRIPTION.string_or(layout, ""),
            rank: RANK.number(layout),
            thumbnail: options
                .include_thumbnail
                .then(|| THUMBNAIL.value(layout).unwrap_or_else(|| json!(""))),
            created: metadata.then(|| CREATED.string_or(layout, "")),
            modified: metadata.then(|| MODIFIED.string_or(layout, "")),
            published: metadata.then(|| PUBLISHED.bool(layout)),
            approved: metadata.then(|| APPROVED.bool(layout)),
        }
    }
}

/// Ids of every sheet in the document, in engine order.
async fn sheet_ids(conn: &mut Connection) -> Result<Vec<String>, EngineError> {
    let document = conn.require_document()?;
    let result = conn
        .call(methods::GET_ALL_INFOS, document, json!({}))
        .await?;
    let infos = result
        .get("qInfos")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::unexpected(methods::GET_ALL_INFOS, "missing qInfos"))?;

    Ok(infos
        .iter()
        .filter(|info| info.get("qType").and_then(Value::as_str) == Some("sheet"))
        .filter_map(|info| info.get("qId").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

/// Every sheet of the open document, ordered by rank. A sheet whose layout
/// cannot be read is kept as a placeholder titled with its id; once the
/// connection is lost, every remaining sheet becomes a placeholder too.
pub async fn fetch_sheets(
    conn: &mut Connection,
    options: SheetOptions,
) -> Result<Vec<ItemOutcome<SheetRecord>>, EngineError> {
    let ids = sheet_ids(conn).await?;
    info!("Found {} sheets", ids.len());

    let mut collector = ItemCollector::default();
    let mut sheets = Vec::with_capacity(ids.len());
    for id in &ids {
        let fetch = async {
            object_layout(conn, id)
                .await
                .map(|layout| SheetRecord::from_layout(id, &layout, options))
        };
        let outcome = collector
            .collect(fetch, || SheetRecord::placeholder(id))
            .await;
        if let ItemOutcome::Degraded { reason, .. } = &outcome {
            warn!("Could not read sheet {}: {}", id, reason);
        }
        sheets.push(outcome);
    }

    sheets.sort_by(|a, b| rank_of(a).total_cmp(&rank_of(b)));
    Ok(sheets)
}

fn rank_of(outcome: &ItemOutcome<SheetRecord>) -> f64 {
    match outcome {
        ItemOutcome::Retrieved(record) => record.rank,
        ItemOutcome::Degraded { record, .. } => record.rank,
    }
}
