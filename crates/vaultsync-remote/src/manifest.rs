//! Manifest wire parsing
//!
//! The manifest endpoint is served by more than one store implementation,
//! so the accepted shapes are deliberately loose:
//!
//! - flat: `{"generatedAt": ..., "files": [{"path": ..., "checksum": ...}, ...]}`
//! - keyed: `{"<path>": {"checksum": ..., "modified": ...}, ...}`
//!
//! Field aliases: `path|file|name`, `checksum|hash|sha256`,
//! `modified|mtime|updatedAt|lastModified`, `size|bytes`. Timestamps may be
//! RFC 3339 strings or epoch milliseconds. Everything normalizes into a
//! [`VaultManifest`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use vaultsync_core::domain::manifest::{ManifestFileRecord, VaultManifest};

use crate::error::ProtocolError;

const PATH_KEYS: &[&str] = &["path", "file", "name"];
const CHECKSUM_KEYS: &[&str] = &["checksum", "hash", "sha256"];
const MODIFIED_KEYS: &[&str] = &["modified", "mtime", "updatedAt", "lastModified"];
const SIZE_KEYS: &[&str] = &["size", "bytes"];
const GENERATED_KEYS: &[&str] = &["generatedAt", "timestamp", "updatedAt"];

/// Normalizes a manifest response body into a [`VaultManifest`].
pub(crate) fn parse_manifest(body: &str) -> Result<VaultManifest, ProtocolError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let obj = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let files = if let Some(files_value) = obj.get("files") {
        let list = files_value
            .as_array()
            .ok_or(ProtocolError::MissingFileList)?;
        list.iter()
            .filter_map(|entry| parse_record(entry, None))
            .collect::<Vec<_>>()
    } else {
        let records: Vec<_> = obj
            .iter()
            .filter(|(_, v)| v.is_object())
            .filter_map(|(key, v)| parse_record(v, Some(key)))
            .collect();
        if records.is_empty() {
            return Err(ProtocolError::MissingFileList);
        }
        records
    };

    let generated_at = first_of(obj, GENERATED_KEYS)
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    Ok(VaultManifest {
        generated_at,
        files,
    })
}

/// Parses one record; `key_path` supplies the path for the keyed shape.
/// Entries with no usable path are skipped rather than failing the
/// whole manifest.
fn parse_record(value: &Value, key_path: Option<&str>) -> Option<ManifestFileRecord> {
    let obj = value.as_object()?;

    let raw_path = match key_path {
        Some(key) => key.to_string(),
        None => first_of(obj, PATH_KEYS)?.as_str()?.to_string(),
    };
    let path = normalize_path(&raw_path);
    if path.is_empty() {
        return None;
    }

    let checksum = first_of(obj, CHECKSUM_KEYS)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let size = first_of(obj, SIZE_KEYS).and_then(Value::as_u64).unwrap_or(0);

    let modified = first_of(obj, MODIFIED_KEYS)
        .and_then(parse_timestamp)
        .unwrap_or(DateTime::UNIX_EPOCH);

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| ManifestFileRecord::category_for_path(&path));

    Some(ManifestFileRecord {
        path,
        size,
        checksum,
        modified,
        category,
    })
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

/// Accepts RFC 3339 strings or epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Forward-slash separators, no leading slash.
fn normalize_path(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}
