use std::path::PathBuf;

use serde_json::Value;

use super::ConfigError;

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Accept a comma-separated string or a list of strings.
///
/// Items are trimmed; empty items and repeats are dropped, order is kept.
pub(super) fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    let raw: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::String(text) => text.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => Ok(text.clone()),
                Value::Number(number) => Ok(number.to_string()),
                other => Err(invalid(key, format!("list items must be strings, got {other}"))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(invalid(
                key,
                format!("expected a list or comma-separated string, got {other}"),
            ));
        }
    };
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|seen| seen == item) {
            continue;
        }
        out.push(item.to_string());
    }
    Ok(out)
}

/// Extension lists are lowercased and lose any leading dots.
pub(super) fn extension_list(key: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    let mut out: Vec<String> = Vec::new();
    for item in string_list(key, value)? {
        let ext = item.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() || out.contains(&ext) {
            continue;
        }
        out.push(ext);
    }
    Ok(out)
}

pub(super) fn boolean(key: &str, value: &Value) -> Result<bool, ConfigError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid(key, format!("expected 0 or 1, got {number}"))),
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(invalid(key, format!("expected a boolean, got {other:?}"))),
        },
        other => Err(invalid(key, format!("expected a boolean, got {other}"))),
    }
}

/// Accept a positive integer or a numeric string, bounded by `max`.
pub(super) fn positive_int(key: &str, value: &Value, max: u32) -> Result<u32, ConfigError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 1 && n <= i64::from(max) => Ok(n as u32),
        Some(n) => Err(invalid(key, format!("must be between 1 and {max}, got {n}"))),
        None => Err(invalid(key, format!("expected an integer, got {value}"))),
    }
}

/// Accept a non-empty path string; blank strings count as unset.
pub(super) fn optional_path(key: &str, value: &Value) -> Result<Option<PathBuf>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Ok(Some(PathBuf::from(text.trim()))),
        other => Err(invalid(key, format!("expected a path string, got {other}"))),
    }
}
