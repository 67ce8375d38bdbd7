//! JSON dataset files: raw records in, canonical records out.
//!
//! Raw input is validated field by field rather than derived, so a malformed
//! record reports its position instead of a serde column offset.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CanonError, CanonResult};
use crate::models::{CanonicalRecord, RawRecord};

/// Parse a raw dataset: `[{"title": string, "lyrics": string}, ...]`.
/// Any missing or non-string field aborts the whole batch.
pub fn parse_raw_records(json: &str) -> CanonResult<Vec<RawRecord>> {
    let root: Value = serde_json::from_str(json)?;
    let items = match root {
        Value::Array(items) => items,
        other => {
            return Err(CanonError::schema(
                0,
                format!("expected a JSON array of records, found {}", type_name(&other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| raw_record_from_value(index, item))
        .collect()
}

fn raw_record_from_value(index: usize, item: &Value) -> CanonResult<RawRecord> {
    let obj = item.as_object().ok_or_else(|| {
        CanonError::schema(index, format!("expected an object, found {}", type_name(item)))
    })?;

    let field = |name: &str| -> CanonResult<String> {
        match obj.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(CanonError::schema(
                index,
                format!("field '{}' must be a string, found {}", name, type_name(other)),
            )),
            None => Err(CanonError::schema(index, format!("missing field '{}'", name))),
        }
    };

    Ok(RawRecord {
        title: field("title")?,
        lyrics: field("lyrics")?,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn read_raw_records(path: &Path) -> CanonResult<Vec<RawRecord>> {
    let json = fs::read_to_string(path)?;
    parse_raw_records(&json)
}

/// Write records as pretty JSON (2-space indent, UTF-8 kept as-is).
fn write_json<T: Serialize>(path: &Path, records: &[T]) -> CanonResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn write_raw_records(path: &Path, records: &[RawRecord]) -> CanonResult<()> {
    write_json(path, records)
}

pub fn write_canonical_records(path: &Path, records: &[CanonicalRecord]) -> CanonResult<()> {
    write_json(path, records)
}

/// Load a canonical dataset (used by the game).
pub fn read_canonical_records(path: &Path) -> CanonResult<Vec<CanonicalRecord>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
