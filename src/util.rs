use crate::error::{ConfigError, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Serialize `value` with sorted keys and 4-space indentation.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    let mut bytes = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value.serialize(&mut serializer)?;
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|err| ConfigError::InvalidArgument(err.to_string()))
}

/// Write JSON through a sibling temp file so readers never see a partial file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = to_json_string(value)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| ConfigError::io(parent, err))?;
    let mut staged = tempfile::NamedTempFile::new_in(parent).map_err(|err| ConfigError::io(parent, err))?;
    staged
        .write_all(text.as_bytes())
        .map_err(|err| ConfigError::io(staged.path(), err))?;
    staged
        .persist(path)
        .map_err(|err| ConfigError::io(path, err.error))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote json");
    Ok(())
}

/// JSON number for `value`, written as an integer when it has no fractional part.
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

pub fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    Ok(serde_json::from_str(&text)?)
}
