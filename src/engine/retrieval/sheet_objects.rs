use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{object_layout, ItemCollector, ItemOutcome};
use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;

const SHEET_TITLE: FieldRule = FieldRule::new(&["/qMeta/title"]);
const CHILD_ID: FieldRule = FieldRule::new(&["/qInfo/qId"]);
const CHILD_TYPE: FieldRule = FieldRule::new(&["/qInfo/qType"]);
const COL: FieldRule = FieldRule::new(&["/qData/col"]);
const ROW: FieldRule = FieldRule::new(&["/qData/row"]);
const COLSPAN: FieldRule = FieldRule::new(&["/qData/colspan"]);
const ROWSPAN: FieldRule = FieldRule::new(&["/qData/rowspan"]);
const MEASURE_LABEL: FieldRule = FieldRule::new(&["/qDef/qLabel"]);
const MEASURE_EXPRESSION: FieldRule = FieldRule::new(&["/qDef/qDef"]);
const DIMENSION_LABEL: FieldRule = FieldRule::new(&["/qDef/qLabel"]);
const DIMENSION_FIELD: FieldRule = FieldRule::new(&["/qDef/qFieldDefs/0"]);

/// Object types that only group other objects and have no data of their own.
const PLACEHOLDER_TYPES: &[&str] = &["container", "filterpane"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetObjectOptions {
    pub include_properties: bool,
    pub include_layout: bool,
    pub include_data_definition: bool,
}

impl Default for SheetObjectOptions {
    fn default() -> Self {
        Self {
            include_properties: true,
            include_layout: true,
            include_data_definition: true,
        }
    }
}

/// Grid position of an object on its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureDef {
    pub label: String,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionDef {
    pub label: String,
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(rename = "sortOrder", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<Value>,
}

impl ObjectProperties {
    fn is_empty(&self) -> bool {
        self.color.is_none() && self.sort_order.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetObjectRecord {
    pub object_id: String,
    pub object_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<ObjectPlacement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measures: Option<Vec<MeasureDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<DimensionDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ObjectProperties>,
}

impl SheetObjectRecord {
    fn bare(object_id: &str, object_type: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            object_type: object_type.to_string(),
            title: None,
            subtitle: None,
            layout: None,
            measures: None,
            dimensions: None,
            properties: None,
        }
    }
}

/// Objects placed on one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetObjects {
    pub sheet_title: String,
    pub objects: Vec<ItemOutcome<SheetObjectRecord>>,
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Build the detailed record for one child. `child` is the entry from the
/// sheet's child list, `layout` the child's own layout.
fn describe_object(
    child: &Value,
    layout: &Value,
    options: SheetObjectOptions,
    record: &mut SheetObjectRecord,
) {
    record.title = layout.get("title").cloned();
    record.subtitle = layout.get("subtitle").cloned();

    if options.include_layout && layout.get("qInfo").is_some() {
        record.layout = Some(ObjectPlacement {
            x: COL.number(child),
            y: ROW.number(child),
            width: COLSPAN.number(child),
            height: ROWSPAN.number(child),
        });
    }

    let hypercube = layout.get("qHyperCubeDef");

    if options.include_data_definition {
        if let Some(cube) = hypercube {
            let measures = cube
                .get("qMeasures")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|m| MeasureDef {
                            label: MEASURE_LABEL.string_or(m, ""),
                            expression: MEASURE_EXPRESSION.string_or(m, ""),
                        })
                        .collect()
                })
                .unwrap_or_default();
            let dimensions = cube
                .get("qDimensions")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|d| DimensionDef {
                            label: DIMENSION_LABEL.string_or(d, ""),
                            field: DIMENSION_FIELD.string_or(d, ""),
                        })
                        .collect()
                })
                .unwrap_or_default();
            record.measures = non_empty(measures);
            record.dimensions = non_empty(dimensions);
        }
    }

    if options.include_properties {
        let properties = ObjectProperties {
            color: layout.get("color").cloned(),
            sort_order: hypercube.and_then(|cube| cube.get("qInterColumnSortOrder").cloned()),
        };
        if !properties.is_empty() {
            record.properties = Some(properties);
        }
    }
}

/// Visualization objects on `sheet_id`. Failing to read the sheet itself is
/// an error; failing to read one of its objects leaves that object with its
/// id and type only, as does every object after the connection is lost.
pub async fn fetch_sheet_objects(
    conn: &mut Connection,
    sheet_id: &str,
    options: SheetObjectOptions,
) -> Result<SheetObjects, EngineError> {
    let sheet = object_layout(conn, sheet_id).await?;
    let sheet_title = SHEET_TITLE.string_or(&sheet, "");
    let children = sheet
        .pointer("/qChildList/qItems")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    info!("Sheet {} has {} objects", sheet_id, children.len());

    let mut collector = ItemCollector::default();
    let mut objects = Vec::with_capacity(children.len());
    for child in &children {
        let id = CHILD_ID.string_or(child, "");
        let object_type = CHILD_TYPE.string_or(child, "");
        let bare = SheetObjectRecord::bare(&id, &object_type);

        if PLACEHOLDER_TYPES.contains(&object_type.as_str()) {
            objects.push(ItemOutcome::Retrieved(bare));
            continue;
        }

        let fetch = async {
            object_layout(conn, &id).await.map(|layout| {
                let mut record = bare.clone();
                describe_object(child, &layout, options, &mut record);
                record
            })
        };
        let outcome = collector.collect(fetch, || bare.clone()).await;
        if let ItemOutcome::Degraded { reason, .. } = &outcome {
            warn!("Could not read object {} on sheet {}: {}", id, sheet_id, reason);
        }
        objects.push(outcome);
    }

    Ok(SheetObjects {
        sheet_title,
        objects,
    })
}
