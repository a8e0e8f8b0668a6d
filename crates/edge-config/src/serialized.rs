//! Serialized config values.
//!
//! The build writes config values in a wire form that carries provenance and
//! an encoded payload. Parsing decodes the payload (or looks up the code it
//! points at), rejects names reserved for internal use and keeps the
//! provenance next to the value.

use edge_core::{DefinedAt, DefinedAtFile, ExportValue};
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};
use crate::imports::ImportRegistry;
use crate::page_config::{ConfigValue, ConfigValues};

/// Config names used internally by page config records.
pub const RESERVED_CONFIG_NAMES: &[&str] =
    &["pageId", "isAllLoaded", "configValues", "loadConfigValuesAll"];

/// Whether `name` collides with an internal key. Names starting with `_` are
/// reserved as well.
pub fn is_reserved_config_name(name: &str) -> bool {
    name.starts_with('_') || RESERVED_CONFIG_NAMES.contains(&name)
}

/// Encoded config value payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SerializedPayload {
    /// JSON text that still has to be decoded.
    Json { value: String },
    /// Value that is already structured.
    Inline { value: serde_json::Value },
    /// Reference to code exported by a bundled module.
    #[serde(rename_all = "camelCase")]
    PointerImport { import_path: String, export_name: String },
}

/// One or several definition sites, as written by the build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinedAtData {
    One(DefinedAtFile),
    Many(Vec<DefinedAtFile>),
}

impl DefinedAtData {
    /// Flatten into an ordered list of sites.
    pub fn into_sites(self) -> DefinedAt {
        match self {
            Self::One(site) => vec![site],
            Self::Many(sites) => sites,
        }
    }
}

/// Wire form of one config value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedConfigValue {
    /// Config name.
    pub name: String,
    /// Encoded value.
    pub value: SerializedPayload,
    /// Where the value was defined. Missing means internal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_at: Option<DefinedAtData>,
}

impl SerializedConfigValue {
    /// A value encoded as JSON text.
    pub fn json(name: impl Into<String>, value: impl Into<String>, defined_at: DefinedAtFile) -> Self {
        Self {
            name: name.into(),
            value: SerializedPayload::Json {
                value: value.into(),
            },
            defined_at: Some(DefinedAtData::One(defined_at)),
        }
    }

    /// A structured value.
    pub fn inline(name: impl Into<String>, value: serde_json::Value, defined_at: DefinedAtFile) -> Self {
        Self {
            name: name.into(),
            value: SerializedPayload::Inline { value },
            defined_at: Some(DefinedAtData::One(defined_at)),
        }
    }

    /// A reference to code exported as `export_name` by `import_path`.
    pub fn import(
        name: impl Into<String>,
        import_path: impl Into<String>,
        export_name: impl Into<String>,
        defined_at: DefinedAtFile,
    ) -> Self {
        Self {
            name: name.into(),
            value: SerializedPayload::PointerImport {
                import_path: import_path.into(),
                export_name: export_name.into(),
            },
            defined_at: Some(DefinedAtData::One(defined_at)),
        }
    }

    /// Replace the definition sites.
    pub fn with_defined_at(mut self, sites: Vec<DefinedAtFile>) -> Self {
        self.defined_at = Some(DefinedAtData::Many(sites));
        self
    }

    /// Decode into a runtime value. Code references are looked up in
    /// `imports`.
    pub fn parse(self, imports: &ImportRegistry) -> LoadResult<(String, ConfigValue)> {
        if is_reserved_config_name(&self.name) {
            return Err(LoadError::ReservedConfigName { name: self.name });
        }

        let value = match self.value {
            SerializedPayload::Json { value } => {
                let value = serde_json::from_str(&value).map_err(|e| LoadError::InvalidConfigValue {
                    name: self.name.clone(),
                    reason: e.to_string(),
                })?;
                ExportValue::Value(value)
            }
            SerializedPayload::Inline { value } => ExportValue::Value(value),
            SerializedPayload::PointerImport {
                import_path,
                export_name,
            } => match imports.resolve(&import_path, &export_name) {
                Some(hook) => ExportValue::Hook(hook.clone()),
                None => {
                    return Err(LoadError::UnresolvedImport {
                        name: self.name,
                        import_path,
                        export_name,
                    })
                }
            },
        };

        let defined_at = self
            .defined_at
            .map(DefinedAtData::into_sites)
            .unwrap_or_default();

        Ok((self.name, ConfigValue::new(value, defined_at)))
    }
}

/// Decode a batch of serialized values. Later entries win over earlier entries
/// with the same name.
pub fn parse_config_values_serialized(
    values: Vec<SerializedConfigValue>,
    imports: &ImportRegistry,
) -> LoadResult<ConfigValues> {
    let mut parsed = ConfigValues::new();
    for value in values {
        let (name, value) = value.parse(imports)?;
        parsed.insert(name, value);
    }
    Ok(parsed)
}
