//! A small "Sales" application served by the mock engine.

use super::engine::{EngineCall, MockReply};
use serde_json::{json, Value};

pub const SALES_APP_ID: &str = "0b1f4a6e-sales";
pub const SHEET_OVERVIEW_ID: &str = "sheet-overview";
pub const SHEET_DETAILS_ID: &str = "sheet-details";
pub const SHEET_BROKEN_ID: &str = "sheet-broken";
pub const CHART_ID: &str = "chart-revenue";
pub const MISSING_APP_ID: &str = "missing-app";

pub const DOC_HANDLE: i64 = 1;

pub const SALES_SCRIPT: &str = "SET ThousandSep=',';\nSales:\nLOAD * FROM [lib://Data/sales.qvd] (qvd);\nRegions:\nLOAD * INLINE [Region\nNorth\nSouth];";

fn ok(value: Value) -> MockReply {
    MockReply::Result(value)
}

fn session_object(handle: i64, generic_id: &str) -> MockReply {
    ok(json!({"qReturn": {"qType": "GenericObject", "qHandle": handle, "qGenericId": generic_id}}))
}

/// Responder for the Sales application. Any document other than
/// [`MISSING_APP_ID`] opens as Sales.
pub fn sales_app(call: &EngineCall) -> MockReply {
    let first_param = call.params.get(0).and_then(Value::as_str);
    match (call.method.as_str(), call.handle, first_param) {
        ("GetDocList", -1, _) => ok(json!({"qDocList": [
            {
                "qDocId": SALES_APP_ID,
                "qTitle": "Sales",
                "qDocName": "Sales.qvf",
                "qLastReloadTime": "2026-10-01T06:00:00.000Z",
                "qMeta": {"stream": {"name": "Everyone"}},
                "qDocType": "QlikView"
            },
            {
                "qDocId": "7c2e-hr",
                "qTitle": "",
                "qDocName": "",
                "qMeta": {}
            }
        ]})),
        ("OpenDoc", -1, Some(MISSING_APP_ID)) => {
            MockReply::Error(1003, "App not found".to_string())
        }
        ("OpenDoc", -1, Some(app)) => ok(json!({
            "qReturn": {"qType": "Doc", "qHandle": DOC_HANDLE, "qGenericId": app}
        })),
        ("GetAppLayout", DOC_HANDLE, _) => ok(json!({"qLayout": {"qTitle": "Sales"}})),

        ("CreateSessionObject", DOC_HANDLE, _) => {
            match call.params[0]["qInfo"]["qType"].as_str() {
                Some("MeasureList") => session_object(10, "session-measures"),
                Some("VariableList") => session_object(11, "session-variables"),
                Some("FieldList") => session_object(12, "session-fields"),
                Some("DimensionList") => session_object(13, "session-dimensions"),
                _ => MockReply::Error(-32602, "Invalid parameters".to_string()),
            }
        }
        ("DestroySessionObject", DOC_HANDLE, _) => ok(json!({"qSuccess": true})),

        ("GetLayout", 10, _) => ok(json!({"qLayout": {"qMeasureList": {"qItems": [
            {
                "qInfo": {"qId": "m-revenue", "qType": "measure"},
                "qMeta": {"title": "Revenue", "description": "Net revenue"},
                "qData": {
                    "id": "m-revenue",
                    "title": "Revenue",
                    "description": "Net revenue",
                    "expression": "Sum(Sales)",
                    "label": "Revenue",
                    "tags": ["finance"]
                }
            },
            {
                "qInfo": {"qId": "m-margin", "qType": "measure"},
                "qMeta": {"title": "Margin"},
                "qData": {"id": "m-margin", "title": "Margin", "expression": "Sum(Sales)-Sum(Cost)"}
            }
        ]}}})),
        ("GetLayout", 11, _) => ok(json!({"qLayout": {"qVariableList": {"qItems": [
            {"qName": "vCurrentYear", "qDefinition": "=Year(Today())", "qData": {"tags": ["time"]}},
            {"qName": "ThousandSep", "qDefinition": ",", "qIsReserved": true, "qIsConfig": true}
        ]}}})),
        ("GetLayout", 12, _) => ok(json!({"qLayout": {"qFieldList": {"qItems": [
            {"qName": "Region", "qCardinal": 2, "qSrcTables": ["Regions", "Sales"], "qTags": ["$key", "$text"]},
            {"qName": "Sales", "qCardinal": 1500, "qIsNumeric": true, "qSrcTables": ["Sales"], "qTags": ["$numeric"]},
            {"qName": "$Table", "qCardinal": 2, "qIsSystem": true, "qIsHidden": true, "qSrcTables": []}
        ]}}})),
        ("GetLayout", 13, _) => ok(json!({"qLayout": {"qDimensionList": {"qItems": [
            {
                "qInfo": {"qId": "d-region", "qType": "dimension"},
                "qMeta": {
                    "title": "Region",
                    "description": "Sales region",
                    "createdDate": "2026-01-01T00:00:00.000Z",
                    "modifiedDate": "2026-02-01T00:00:00.000Z",
                    "published": true,
                    "approved": false
                },
                "qData": {"title": "Region", "tags": [], "grouping": "N", "info": [{"qName": "Region", "qTags": ["$key"]}]}
            }
        ]}}})),

        ("GetScript", DOC_HANDLE, _) => ok(json!({"qScript": SALES_SCRIPT})),
        ("GetLineage", DOC_HANDLE, _) => ok(json!({"qLineage": [
            {"qDiscriminator": "lib://Data/sales.qvd"},
            {"qDiscriminator": "RESIDENT Sales"},
            {"qDiscriminator": "INLINE;"},
            {"qDiscriminator": "Apps/Base.qvf", "qStatement": "Binary"},
            {"qDiscriminator": "AUTOGENERATE"}
        ]})),

        ("GetAllInfos", DOC_HANDLE, _) => ok(json!({"qInfos": [
            {"qId": SHEET_DETAILS_ID, "qType": "sheet"},
            {"qId": "bookmark-1", "qType": "bookmark"},
            {"qId": SHEET_OVERVIEW_ID, "qType": "sheet"},
            {"qId": SHEET_BROKEN_ID, "qType": "sheet"},
            {"qId": CHART_ID, "qType": "barchart"}
        ]})),
        ("GetObject", DOC_HANDLE, Some(SHEET_OVERVIEW_ID)) => {
            ok(json!({"qReturn": {"qType": "GenericObject", "qHandle": 20}}))
        }
        ("GetObject", DOC_HANDLE, Some(SHEET_DETAILS_ID)) => {
            ok(json!({"qReturn": {"qType": "GenericObject", "qHandle": 21}}))
        }
        ("GetObject", DOC_HANDLE, Some(CHART_ID)) => {
            ok(json!({"qReturn": {"qType": "GenericObject", "qHandle": 30}}))
        }
        ("GetObject", DOC_HANDLE, Some(_)) => {
            MockReply::Error(2, "Object not found".to_string())
        }
        ("GetLayout", 20, _) => ok(json!({"qLayout": {
            "qInfo": {"qId": SHEET_OVERVIEW_ID, "qType": "sheet"},
            "qMeta": {"title": "Overview", "description": "Key figures", "published": true},
            "rank": 0,
            "qChildList": {"qItems": [
                {
                    "qInfo": {"qId": CHART_ID, "qType": "barchart"},
                    "qData": {"col": 0, "row": 0, "colspan": 12, "rowspan": 8}
                },
                {"qInfo": {"qId": "filters-1", "qType": "filterpane"}, "qData": {}},
                {"qInfo": {"qId": "kpi-deleted", "qType": "kpi"}, "qData": {}}
            ]}
        }})),
        ("GetLayout", 21, _) => ok(json!({"qLayout": {
            "qInfo": {"qId": SHEET_DETAILS_ID, "qType": "sheet"},
            "qMeta": {"title": "Details"},
            "rank": 1.5,
            "qChildList": {"qItems": []}
        }})),
        ("GetLayout", 30, _) => ok(json!({"qLayout": {
            "qInfo": {"qId": CHART_ID, "qType": "barchart"},
            "title": "Revenue by region",
            "subtitle": "",
            "qHyperCubeDef": {
                "qDimensions": [{"qDef": {"qFieldDefs": ["Region"], "qLabel": "Region"}}],
                "qMeasures": [{"qDef": {"qDef": "Sum(Sales)", "qLabel": "Revenue"}}],
                "qInterColumnSortOrder": [1, 0]
            }
        }})),

        _ => MockReply::Error(-32601, format!("Unknown method {}", call.method)),
    }
}
