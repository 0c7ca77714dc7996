//! Field extraction from engine layouts.
//!
//! Layout items carry the same logical field at different paths depending
//! on object type and engine version. A [`FieldRule`] lists the candidate
//! paths in priority order; the first candidate holding a value of the
//! requested JSON type wins.

use serde_json::Value;

use super::error::EngineError;

/// Content of a `GetLayout`/`GetAppLayout` result.
///
/// Some objects nest everything under `qLayout`, others return it at the
/// top level.
pub fn unwrap_layout(result: &Value) -> &Value {
    match result.get("qLayout") {
        Some(layout) if layout.is_object() => layout,
        _ => result,
    }
}

/// Handle of an object returned by `CreateSessionObject` or `GetObject`.
pub fn object_handle(result: &Value, method: &str) -> Result<i64, EngineError> {
    result
        .pointer("/qReturn/qHandle")
        .and_then(Value::as_i64)
        .ok_or_else(|| EngineError::unexpected(method, "missing qReturn.qHandle"))
}

/// Ordered JSON-pointer candidates for one output field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    candidates: &'static [&'static str],
    skip_empty: bool,
}

impl FieldRule {
    pub const fn new(candidates: &'static [&'static str]) -> Self {
        Self {
            candidates,
            skip_empty: false,
        }
    }

    /// Treat empty strings as absent and keep looking.
    pub const fn skip_empty(mut self) -> Self {
        self.skip_empty = true;
        self
    }

    pub fn candidates(&self) -> &'static [&'static str] {
        self.candidates
    }

    fn first<'v, T>(&self, item: &'v Value, accept: impl Fn(&'v Value) -> Option<T>) -> Option<T> {
        self.candidates
            .iter()
            .filter_map(|path| item.pointer(path))
            .find_map(accept)
    }

    pub fn string(&self, item: &Value) -> Option<String> {
        self.first(item, |value| match value.as_str() {
            Some(s) if self.skip_empty && s.is_empty() => None,
            Some(s) => Some(s.to_string()),
            None => None,
        })
    }

    pub fn string_or(&self, item: &Value, default: &str) -> String {
        self.string(item).unwrap_or_else(|| default.to_string())
    }

    /// Defaults to `false`.
    pub fn bool(&self, item: &Value) -> bool {
        self.first(item, Value::as_bool).unwrap_or(false)
    }

    /// Defaults to an empty list.
    pub fn array(&self, item: &Value) -> Vec<Value> {
        self.first(item, |value| value.as_array().cloned())
            .unwrap_or_default()
    }

    /// String elements of the first array candidate.
    pub fn strings(&self, item: &Value) -> Vec<String> {
        self.array(item)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Defaults to `0`.
    pub fn number(&self, item: &Value) -> f64 {
        self.first(item, Value::as_f64).unwrap_or(0.0)
    }

    /// Raw value of the first candidate that is present and not null.
    pub fn value(&self, item: &Value) -> Option<Value> {
        self.first(item, |value| (!value.is_null()).then(|| value.clone()))
    }
}
