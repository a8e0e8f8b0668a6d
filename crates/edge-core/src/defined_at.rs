//! Definition-site diagnostics.
//!
//! Every config value and hook remembers where it was declared so that error
//! messages can point the user at the right file:
//!
//! ```text
//! Config title defined at /pages/index/+config.js
//! Config onRenderHtml defined at /renderer/+config.js > export default { onRenderHtml }
//! Config ssr defined internally
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// One file (and optional export inside it) where a value was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedAtFile {
    /// File path as shown to the user (e.g. `/pages/index/+config.js`).
    pub file_path: String,
    /// Path of the export inside the file, e.g. `["default", "title"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<Vec<String>>,
}

impl DefinedAtFile {
    /// A value defined by the default export of `file_path`.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            export_path: None,
        }
    }

    /// Set the export path.
    pub fn with_export_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.export_path = Some(path.into_iter().map(Into::into).collect());
        self
    }

    /// Render this location, e.g. `/renderer/+config.js > export { Layout }`.
    pub fn location(&self, config_name: &str) -> String {
        match export_path_string(self.export_path.as_deref(), config_name) {
            Some(export_path) => format!("{} > {}", self.file_path, export_path),
            None => self.file_path.clone(),
        }
    }
}

/// Ordered definition sites of one value. Empty means "defined internally".
pub type DefinedAt = Vec<DefinedAtFile>;

/// First word of a definition-site sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceBegin {
    /// `Config ...`, at the start of a message.
    Config,
    /// `config ...`, inside a message.
    ConfigLower,
}

impl fmt::Display for SentenceBegin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "Config"),
            Self::ConfigLower => write!(f, "config"),
        }
    }
}

/// Format `"<Begin> <name> defined at <loc> / <loc>"`, or
/// `"<Begin> <name> defined internally"` when there is no site.
pub fn format_defined_at(begin: SentenceBegin, config_name: &str, sites: &[DefinedAtFile]) -> String {
    if sites.is_empty() {
        format!("{} {} defined internally", begin, config_name)
    } else {
        config_defined_at(begin, config_name, sites)
    }
}

/// Format `"<Begin> <name> defined at <locations>"`.
///
/// Callers use this when the value is known to come from a user file; an empty
/// `sites` slice renders an empty location list.
pub fn config_defined_at(begin: SentenceBegin, config_name: &str, sites: &[DefinedAtFile]) -> String {
    format!(
        "{} {} defined at {}",
        begin,
        config_name,
        defined_at_string(sites, config_name)
    )
}

/// Join all locations with `" / "`.
pub fn defined_at_string(sites: &[DefinedAtFile], config_name: &str) -> String {
    sites
        .iter()
        .map(|site| site.location(config_name))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Render an export path as the user would have written it.
///
/// `None`, `[]`, `["*"]`, `["default"]` and `[config_name]` are implied by the
/// file itself and render nothing.
pub fn export_path_string(path: Option<&[String]>, config_name: &str) -> Option<String> {
    let (export_name, object_path) = path?.split_first()?;

    if object_path.is_empty()
        && (export_name == "*" || export_name == "default" || export_name == config_name)
    {
        return None;
    }

    let (mut prefix, props): (String, Vec<&str>) = if export_name == "default" {
        (
            "export default".to_string(),
            object_path.iter().map(String::as_str).collect(),
        )
    } else {
        (
            "export".to_string(),
            std::iter::once(export_name.as_str())
                .chain(object_path.iter().map(String::as_str))
                .collect(),
        )
    };

    let mut suffix = String::new();
    for prop in props {
        prefix = format!("{} {{ {}", prefix, prop);
        suffix = format!(" }}{}", suffix);
    }

    Some(prefix + &suffix)
}
