//! Config-file workflows: default generation, callback-driven edits, overrides.
use crate::defaults::{resolve_all, resolve_section, PARAMETERS_KEY, SCHEMA_KEY};
use crate::dict::SchemaDict;
use crate::error::{ConfigError, Result};
use crate::schema::SchemaDocument;
use crate::util;
use serde_json::Value;
use std::path::Path;

/// Caller-supplied edit applied to a configuration before it is finalized.
pub type SetFn<'a> = &'a dyn Fn(&mut SchemaDict) -> Result<()>;

/// Where a configuration comes from: a Default Configuration file or an
/// already-loaded tree.
#[derive(Debug)]
pub enum ConfigSource<'a> {
    Path(&'a Path),
    Loaded(SchemaDict),
}

/// Resolve every schema group into one Default Configuration.
pub fn default_config_from_schema(schema_path: &Path, include_schema_node: bool) -> Result<Value> {
    let document = SchemaDocument::load(schema_path)?;
    let mut config = resolve_all(&document);
    if !include_schema_node {
        if let Some(parameters) = config
            .get_mut(PARAMETERS_KEY)
            .and_then(Value::as_object_mut)
        {
            parameters.remove(SCHEMA_KEY);
        }
    }
    Ok(config)
}

pub fn write_default_config(
    schema_path: &Path,
    out_path: &Path,
    include_schema_node: bool,
) -> Result<Value> {
    let config = default_config_from_schema(schema_path, include_schema_node)?;
    util::write_json(out_path, &config)?;
    tracing::info!(path = %out_path.display(), "wrote default config");
    Ok(config)
}

/// Wrap the defaults of one schema sub-node, e.g. `["config", "Drugs"]`.
pub fn config_from_subnode(schema_path: &Path, path: &[&str]) -> Result<SchemaDict> {
    let document = SchemaDocument::load(schema_path)?;
    let section = document
        .subnode(path)
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ConfigError::InvalidArgument(format!("schema has no object at {}", path.join(".")))
        })?;
    let resolved = resolve_section(section, document.idm_types());
    SchemaDict::from_default(resolved.into_default_config(), &document)
}

/// Read a Default Configuration file (schema sub-map included) and wrap it.
pub fn load_default_config(path: &Path) -> Result<SchemaDict> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    SchemaDict::from_plain(util::read_json(path)?)
}

/// Load (or take) a configuration and apply the optional edit callback.
///
/// Writes made by the callback go through the schema-checked setter.
pub fn config_from_default_and_params(
    source: ConfigSource<'_>,
    set_fn: Option<SetFn<'_>>,
) -> Result<SchemaDict> {
    let mut config = match source {
        ConfigSource::Path(path) => load_default_config(path)?,
        ConfigSource::Loaded(config) => config,
    };
    if let Some(set_fn) = set_fn {
        set_fn(&mut config)?;
    }
    Ok(config)
}

/// Load, edit, finalize and write a config file.
pub fn write_config_from_default_and_params(
    config_path: &Path,
    set_fn: Option<SetFn<'_>>,
    out_path: &Path,
) -> Result<SchemaDict> {
    let mut config = config_from_default_and_params(ConfigSource::Path(config_path), set_fn)?;
    config.finalize()?;
    util::write_json(out_path, &config)?;
    tracing::info!(path = %out_path.display(), "wrote config");
    Ok(config)
}

/// Merge an overrides document such as `{"parameters": {"Run_Number": 3}}`.
///
/// Nested objects are merged key by key so every level keeps its own write rules.
pub fn apply_overrides(config: &mut SchemaDict, overrides: &Value) -> Result<()> {
    let Value::Object(overrides) = overrides else {
        return Err(ConfigError::InvalidArgument(
            "overrides must be a JSON object".to_string(),
        ));
    };
    for (key, value) in overrides {
        match value {
            Value::Object(_) if config.child(key).is_some() => {
                apply_overrides(config.child_mut(key)?, value)?;
            }
            _ => config.set(key, value.clone())?,
        }
    }
    Ok(())
}

/// Finalized defaults for every schema group.
pub fn config_from_schema(schema_path: &Path) -> Result<SchemaDict> {
    let document = SchemaDocument::load(schema_path)?;
    let mut config = SchemaDict::from_default(resolve_all(&document), &document)?;
    config.finalize()?;
    Ok(config)
}

/// Defaults from the schema, overrides on top, then finalize.
pub fn config_from_overrides(schema_path: &Path, overrides_path: &Path) -> Result<SchemaDict> {
    let document = SchemaDocument::load(schema_path)?;
    let mut config = SchemaDict::from_default(resolve_all(&document), &document)?;
    if !overrides_path.is_file() {
        return Err(ConfigError::ConfigNotFound {
            path: overrides_path.to_path_buf(),
        });
    }
    let overrides = util::read_json(overrides_path)?;
    apply_overrides(&mut config, &overrides)?;
    config.finalize()?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
