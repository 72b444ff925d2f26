//! Manifest loader (SPEC_FULL §2 addition #1).
//!
//! Parses the JSON manifest into an immutable map before any scoring
//! begins, validating the required fields per candidate. Grounded on the
//! teacher's `persistence::models` pattern of converting stored rows into
//! domain structs with explicit field validation, generalized from SQLite
//! rows to JSON manifest entries.

use crate::error::{Error, Result};
use crate::types::ManifestRecord;
use std::collections::HashMap;
use std::path::Path;

/// Loads and validates the manifest file, keyed by `file_name`.
pub fn load(path: &Path) -> Result<HashMap<String, ManifestRecord>> {
    if !path.exists() {
        return Err(Error::InputMissing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let raw: serde_json::Value = serde_json::from_slice(&bytes)?;

    let entries = raw
        .as_array()
        .ok_or_else(|| Error::ManifestMalformed("manifest root must be a JSON array".to_string()))?;

    let mut map = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let record = parse_record(entry, i)?;
        map.insert(record.file_name.clone(), record);
    }
    Ok(map)
}

fn parse_record(value: &serde_json::Value, index: usize) -> Result<ManifestRecord> {
    let obj = value.as_object().ok_or_else(|| {
        Error::ManifestMalformed(format!("manifest entry {index} must be a JSON object"))
    })?;

    let file_name = obj
        .get("file_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::ManifestMalformed(format!(
                "manifest entry {index} is missing a string `file_name`"
            ))
        })?
        .to_string();

    let width = obj
        .get("width")
        .and_then(|v| v.as_u64())
        .filter(|w| *w > 0)
        .ok_or_else(|| {
            Error::ManifestMalformed(format!(
                "manifest entry `{file_name}` is missing a positive integer `width`"
            ))
        })? as u32;

    let height = obj
        .get("height")
        .and_then(|v| v.as_u64())
        .filter(|h| *h > 0)
        .ok_or_else(|| {
            Error::ManifestMalformed(format!(
                "manifest entry `{file_name}` is missing a positive integer `height`"
            ))
        })? as u32;

    let mut extra = obj.clone();
    extra.remove("file_name");
    extra.remove("width");
    extra.remove("height");

    Ok(ManifestRecord {
        file_name,
        width,
        height,
        extra,
    })
}
