use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::engine::connection::Connection;
use crate::engine::error::EngineError;
use crate::engine::extract::FieldRule;
use crate::engine::protocol::methods;

const DISCRIMINATOR: FieldRule = FieldRule::new(&["/qDiscriminator"]);
const STATEMENT: FieldRule = FieldRule::new(&["/qStatement"]).skip_empty();

/// Markers that make a discriminator look like a file path or URL.
const PATH_MARKERS: &[&str] = &[
    "\\", "/", ".", "lib://", "http://", "https://", "ftp://", ".txt", ".csv", ".xlsx", ".qvd",
];

/// Origin of a load statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Binary,
    Resident,
    File,
    Inline,
    Other,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Binary,
        SourceKind::Resident,
        SourceKind::File,
        SourceKind::Inline,
        SourceKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Binary => "binary",
            SourceKind::Resident => "resident",
            SourceKind::File => "file",
            SourceKind::Inline => "inline",
            SourceKind::Other => "other",
        }
    }
}

/// Classify a lineage entry. First match wins: binary statement, resident
/// table, inline data, path-like discriminator, anything else.
pub fn classify_source(discriminator: &str, statement: Option<&str>) -> SourceKind {
    if statement.is_some_and(|s| s.eq_ignore_ascii_case("binary")) {
        return SourceKind::Binary;
    }

    let discriminator = discriminator.to_lowercase();
    if discriminator.starts_with("resident ") {
        SourceKind::Resident
    } else if discriminator.starts_with("inline") {
        SourceKind::Inline
    } else if PATH_MARKERS.iter().any(|m| discriminator.contains(m)) {
        SourceKind::File
    } else {
        SourceKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageOptions {
    pub include_resident: bool,
    pub include_file_sources: bool,
    pub include_binary_sources: bool,
    pub include_inline_sources: bool,
}

impl Default for LineageOptions {
    fn default() -> Self {
        Self {
            include_resident: true,
            include_file_sources: true,
            include_binary_sources: true,
            include_inline_sources: true,
        }
    }
}

impl LineageOptions {
    /// Unclassified sources are always kept.
    pub fn includes(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Binary => self.include_binary_sources,
            SourceKind::Resident => self.include_resident,
            SourceKind::File => self.include_file_sources,
            SourceKind::Inline => self.include_inline_sources,
            SourceKind::Other => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    pub discriminator: String,
    pub statement: Option<String>,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

/// Filtered data sources of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageReport {
    pub data_sources: Vec<DataSource>,
}

impl LineageReport {
    pub fn count(&self, kind: SourceKind) -> usize {
        self.data_sources.iter().filter(|s| s.kind == kind).count()
    }

    /// `{"binary_count": n, ...}` for every kind.
    pub fn category_counts(&self) -> Value {
        let mut counts = serde_json::Map::new();
        for kind in SourceKind::ALL {
            counts.insert(format!("{}_count", kind.as_str()), json!(self.count(kind)));
        }
        Value::Object(counts)
    }

    /// Sources grouped under their kind name.
    pub fn by_category(&self) -> Value {
        let mut groups = serde_json::Map::new();
        for kind in SourceKind::ALL {
            let members: Vec<&DataSource> =
                self.data_sources.iter().filter(|s| s.kind == kind).collect();
            groups.insert(kind.as_str().to_string(), json!(members));
        }
        Value::Object(groups)
    }
}

pub async fn fetch_lineage(
    conn: &mut Connection,
    options: LineageOptions,
) -> Result<LineageReport, EngineError> {
    let document = conn.require_document()?;
    let result = conn.call(methods::GET_LINEAGE, document, json!({})).await?;

    let items = match result.get("qLineage") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(_) => {
            return Err(EngineError::unexpected(
                methods::GET_LINEAGE,
                "qLineage is not an array",
            ))
        }
    };

    let data_sources: Vec<DataSource> = items
        .iter()
        .map(|item| {
            let discriminator = DISCRIMINATOR.string_or(item, "");
            let statement = STATEMENT.string(item);
            let kind = classify_source(&discriminator, statement.as_deref());
            DataSource {
                discriminator,
                statement,
                kind,
            }
        })
        .filter(|source| options.includes(source.kind))
        .collect();

    info!(
        "Found {} data sources in {} lineage entries",
        data_sources.len(),
        items.len()
    );
    Ok(LineageReport { data_sources })
}
