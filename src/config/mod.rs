//! Raw Configuration Ingestion
//!
//! This module turns host-supplied configuration into the flat key/value
//! mapping that credentials variants validate.
//!
//! # Sources
//! 1. A JSON profile document (one object of credential fields)
//! 2. CLI overrides (`key=value`, highest priority)
//! 3. Environment variable references for secrets (`password_env`)
//!
//! Profile discovery (which file, which target) belongs to the host. This
//! module only parses what it is handed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{AdapterError, Result};

/// Flat mapping of field names to JSON-compatible values
pub type RawConfig = serde_json::Map<String, Value>;

/// Parse a JSON document into a raw credential mapping
///
/// The document root must be an object.
pub fn parse_raw_config(contents: &str) -> Result<RawConfig> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| AdapterError::config(format!("Invalid profile document: {e}")))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(AdapterError::config(format!(
            "Profile document must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Read and parse a profile document from disk
pub fn load_raw_config(path: &Path) -> Result<RawConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        AdapterError::config(format!("Could not read profile {}: {e}", path.display()))
    })?;

    parse_raw_config(&contents)
}

/// Apply `key=value` overrides on top of a base mapping
///
/// Values that parse as JSON (numbers, booleans, `null`, quoted strings,
/// arrays, objects) are stored as such; anything else is stored as a string.
pub fn apply_overrides<I>(mut base: RawConfig, overrides: I) -> Result<RawConfig>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    for item in overrides {
        let item = item.as_ref();
        let (key, raw_value) = item.split_once('=').ok_or_else(|| {
            AdapterError::invalid_input(format!("Override '{item}' must have the form key=value"))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(AdapterError::invalid_input(format!(
                "Override '{item}' has an empty key"
            )));
        }

        let value = serde_json::from_str(raw_value)
            .unwrap_or_else(|_| Value::String(raw_value.to_string()));
        base.insert(key.to_string(), value);
    }

    Ok(base)
}

/// Stored credential fields with optional indirection for the password
///
/// Stored profiles may reference the password through an environment variable
/// instead of holding it inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Credential fields, passed through untouched
    #[serde(flatten)]
    pub fields: RawConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredCredentials {
    /// Resolve environment variables and return the raw mapping
    pub fn resolve(&self) -> Result<RawConfig> {
        let mut fields = self.fields.clone();

        if let Some(env_var) = &self.password_env {
            match std::env::var(env_var) {
                Ok(password) => {
                    fields.insert("password".to_string(), Value::String(password));
                }
                Err(_) => {
                    return Err(AdapterError::config(format!(
                        "Environment variable {env_var} not found for password"
                    )));
                }
            }
        }

        Ok(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
