//! Credentials Contract
//!
//! Every adapter declares one credentials variant. A variant is a plain serde
//! struct implementing [`Credentials`], which supplies:
//! - the adapter type discriminator (`TYPE`)
//! - the legacy alias map (`ALIASES`, empty unless overridden)
//! - the required/optional field schema
//! - the display allow-list (`CONNECTION_KEYS`)
//!
//! # Two Projections
//! - [`Credentials::to_serializable`] is complete and may contain secrets. It is
//!   used for persistence and snapshots.
//! - [`Credentials::connection_info`] is the only sanctioned way to render
//!   credentials to a user or a log. It never emits a key outside the allow-list.
//!
//! # Closed Variant Set
//! The built-in variants are gathered in [`CredentialsKind`] (selected by
//! adapter name) and [`AdapterCredentials`] (a constructed instance).
//! Instances are immutable; [`Credentials::with_overrides`] returns a copy.

use serde::de::value::MapDeserializer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::Cell;
use std::str::FromStr;
use tracing::debug;

use crate::config::RawConfig;
use crate::error::{AdapterError, Result};
use crate::identifier::is_valid_identifier;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlCredentials;
pub use postgres::PostgresCredentials;
pub use sqlite::SqliteCredentials;

/// Fields present on every credentials variant
pub const BASE_FIELDS: &[&str] = &["database", "schema"];

/// Key carrying the type discriminator in raw profile input
pub const TYPE_KEY: &str = "type";

/// Capability every adapter's credential type implements
pub trait Credentials:
    Serialize + DeserializeOwned + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// Adapter type discriminator; must be a valid identifier
    const TYPE: &'static str;

    /// Legacy/alternate field name → canonical field name
    const ALIASES: &'static [(&'static str, &'static str)] = &[];

    /// Variant-specific required fields (in addition to [`BASE_FIELDS`])
    const REQUIRED_FIELDS: &'static [&'static str];

    /// Variant-specific optional fields
    const OPTIONAL_FIELDS: &'static [&'static str] = &[];

    /// Keys sanctioned for display, in display order
    const CONNECTION_KEYS: &'static [&'static str];

    fn database(&self) -> &str;

    fn schema(&self) -> &str;

    /// The adapter type this instance belongs to
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    /// Validate raw key/value input and construct an instance
    ///
    /// 1. Aliases are rewritten to their canonical names (canonical wins when
    ///    both are present).
    /// 2. The result is checked against the field schema.
    /// 3. The instance is built.
    fn from_raw_config(raw: &RawConfig) -> Result<Self> {
        if !is_valid_identifier(Self::TYPE) {
            return Err(AdapterError::schema(format!(
                "credentials type '{}' is not a valid identifier",
                Self::TYPE
            )));
        }

        let mut fields = translate_aliases(raw, Self::ALIASES);

        if let Some(declared) = fields.remove(TYPE_KEY) {
            if declared.as_str() != Some(Self::TYPE) {
                return Err(AdapterError::schema(format!(
                    "expected credentials of type '{}', got {declared}",
                    Self::TYPE
                )));
            }
        }

        let missing: Vec<String> = BASE_FIELDS
            .iter()
            .chain(Self::REQUIRED_FIELDS)
            .filter(|key| fields.get(**key).map_or(true, Value::is_null))
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            let detail = format!("missing required fields: {}", missing.join(", "));
            return Err(AdapterError::validation(Self::TYPE, missing, detail));
        }

        fields.retain(|key, _| {
            let declared = is_declared::<Self>(key);
            if !declared {
                debug!(adapter = Self::TYPE, field = %key, "ignoring unrecognized credential field");
            }
            declared
        });

        decode_fields(&fields)
    }

    /// Ordered `(key, value)` pairs restricted to [`Self::CONNECTION_KEYS`]
    ///
    /// Allow-listed keys absent from the instance are skipped.
    fn connection_info(&self) -> Result<Vec<(&'static str, Value)>> {
        let serialized = self.to_serializable(false)?;
        Ok(Self::CONNECTION_KEYS
            .iter()
            .filter_map(|key| serialized.get(*key).map(|value| (*key, value.clone())))
            .collect())
    }

    /// Full structural serialization (unset optional fields omitted)
    ///
    /// With `include_alias_duplicates`, each canonical value is repeated under
    /// its alias names for consumers that still read the old keys.
    fn to_serializable(&self, include_alias_duplicates: bool) -> Result<RawConfig> {
        let mut serialized = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(AdapterError::validation(
                    Self::TYPE,
                    Vec::new(),
                    format!("credentials serialized to a non-object value: {other}"),
                ))
            }
            Err(e) => return Err(AdapterError::validation(Self::TYPE, Vec::new(), e.to_string())),
        };

        if include_alias_duplicates {
            for (alias, canonical) in Self::ALIASES {
                if let Some(value) = serialized.get(*canonical).cloned() {
                    serialized.insert((*alias).to_string(), value);
                }
            }
        }

        Ok(serialized)
    }

    /// Copy with the supplied fields replaced; the receiver is untouched
    fn with_overrides(&self, partial: &RawConfig) -> Result<Self> {
        let mut merged = self.to_serializable(false)?;
        merged.extend(translate_aliases(partial, Self::ALIASES));
        Self::from_raw_config(&merged)
    }
}

/// Decode declared fields into `C`, naming the field that failed
///
/// The decoder's own message quotes the rejected value, so only the field name
/// and what the decoder expected are kept.
fn decode_fields<C: Credentials>(fields: &RawConfig) -> Result<C> {
    let current: Cell<Option<&str>> = Cell::new(None);
    let entries = fields.iter().map(|(key, value)| {
        current.set(Some(key.as_str()));
        (key.as_str(), value.clone())
    });

    C::deserialize(MapDeserializer::<_, serde_json::Error>::new(entries)).map_err(|e| {
        let message = e.to_string();
        let expected = message.split_once(", expected ").map(|(_, expected)| expected);
        match (current.get(), expected) {
            (Some(field), Some(expected)) => AdapterError::validation(
                C::TYPE,
                vec![field.to_string()],
                format!("field '{field}' must be {expected}"),
            ),
            (Some(field), None) => AdapterError::validation(
                C::TYPE,
                vec![field.to_string()],
                format!("field '{field}' has an invalid value"),
            ),
            (None, _) => AdapterError::validation(C::TYPE, Vec::new(), "credentials could not be decoded"),
        }
    })
}

fn is_declared<C: Credentials>(key: &str) -> bool {
    BASE_FIELDS
        .iter()
        .chain(C::REQUIRED_FIELDS)
        .chain(C::OPTIONAL_FIELDS)
        .any(|field| *field == key)
}

/// Rewrite alias keys to their canonical names
///
/// When both an alias and its canonical key are present, the canonical value
/// is kept and the alias is dropped.
#[must_use]
pub fn translate_aliases(raw: &RawConfig, aliases: &[(&str, &str)]) -> RawConfig {
    let mut translated = RawConfig::new();

    for (key, value) in raw {
        match aliases.iter().find(|(alias, _)| *alias == key.as_str()) {
            Some((alias, canonical)) if raw.contains_key(*canonical) => {
                debug!(alias = %alias, canonical = %canonical, "canonical key present, dropping alias");
            }
            Some((_, canonical)) => {
                translated.insert((*canonical).to_string(), value.clone());
            }
            None => {
                translated.insert(key.clone(), value.clone());
            }
        }
    }

    translated
}

/// The closed set of built-in credentials variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialsKind {
    /// `PostgreSQL` credentials
    Postgres,
    /// `MySQL` credentials (includes `MariaDB`)
    #[serde(rename = "mysql")]
    MySql,
    /// `SQLite` credentials
    Sqlite,
}

impl CredentialsKind {
    /// All built-in variants
    pub const ALL: [Self; 3] = [Self::Postgres, Self::MySql, Self::Sqlite];

    /// Get the adapter type name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => PostgresCredentials::TYPE,
            Self::MySql => MySqlCredentials::TYPE,
            Self::Sqlite => SqliteCredentials::TYPE,
        }
    }

    /// Display allow-list of this variant
    #[must_use]
    pub const fn connection_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Postgres => PostgresCredentials::CONNECTION_KEYS,
            Self::MySql => MySqlCredentials::CONNECTION_KEYS,
            Self::Sqlite => SqliteCredentials::CONNECTION_KEYS,
        }
    }

    /// Alias map of this variant
    #[must_use]
    pub const fn aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Postgres => PostgresCredentials::ALIASES,
            Self::MySql => MySqlCredentials::ALIASES,
            Self::Sqlite => SqliteCredentials::ALIASES,
        }
    }

    /// Build credentials of this variant from raw input
    pub fn from_raw_config(&self, raw: &RawConfig) -> Result<AdapterCredentials> {
        let credentials = match self {
            Self::Postgres => AdapterCredentials::Postgres(PostgresCredentials::from_raw_config(raw)?),
            Self::MySql => AdapterCredentials::MySql(MySqlCredentials::from_raw_config(raw)?),
            Self::Sqlite => AdapterCredentials::Sqlite(SqliteCredentials::from_raw_config(raw)?),
        };
        debug!(adapter = self.as_str(), "credentials validated");
        Ok(credentials)
    }
}

impl std::fmt::Display for CredentialsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CredentialsKind {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AdapterError::not_found(s))
    }
}

/// A constructed credentials instance of any built-in variant
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCredentials {
    Postgres(PostgresCredentials),
    MySql(MySqlCredentials),
    Sqlite(SqliteCredentials),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            AdapterCredentials::Postgres($c) => $body,
            AdapterCredentials::MySql($c) => $body,
            AdapterCredentials::Sqlite($c) => $body,
        }
    };
}

impl AdapterCredentials {
    #[must_use]
    pub const fn kind(&self) -> CredentialsKind {
        match self {
            Self::Postgres(_) => CredentialsKind::Postgres,
            Self::MySql(_) => CredentialsKind::MySql,
            Self::Sqlite(_) => CredentialsKind::Sqlite,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        dispatch!(self, c => c.type_name())
    }

    #[must_use]
    pub fn database(&self) -> &str {
        dispatch!(self, c => c.database())
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        dispatch!(self, c => c.schema())
    }

    /// See [`Credentials::connection_info`]
    pub fn connection_info(&self) -> Result<Vec<(&'static str, Value)>> {
        dispatch!(self, c => c.connection_info())
    }

    /// See [`Credentials::to_serializable`]
    pub fn to_serializable(&self, include_alias_duplicates: bool) -> Result<RawConfig> {
        dispatch!(self, c => c.to_serializable(include_alias_duplicates))
    }

    /// See [`Credentials::with_overrides`]
    pub fn with_overrides(&self, partial: &RawConfig) -> Result<Self> {
        Ok(match self {
            Self::Postgres(c) => Self::Postgres(c.with_overrides(partial)?),
            Self::MySql(c) => Self::MySql(c.with_overrides(partial)?),
            Self::Sqlite(c) => Self::Sqlite(c.with_overrides(partial)?),
        })
    }
}

impl From<PostgresCredentials> for AdapterCredentials {
    fn from(value: PostgresCredentials) -> Self {
        Self::Postgres(value)
    }
}

impl From<MySqlCredentials> for AdapterCredentials {
    fn from(value: MySqlCredentials) -> Self {
        Self::MySql(value)
    }
}

impl From<SqliteCredentials> for AdapterCredentials {
    fn from(value: SqliteCredentials) -> Self {
        Self::Sqlite(value)
    }
}
