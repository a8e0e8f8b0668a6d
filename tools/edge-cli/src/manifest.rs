//! Build manifest: discovery output written by the build, read by `edge inspect`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use edge_config::{
    ConfigValueStore, ImportRegistry, PageConfigRuntime, SerializedConfigValue, StaticConfigValues,
};
use edge_loader::{
    page_file_loader, FileExports, Hook, PageAssets, PageFile, PageFileScope, PageFileType,
};
use serde::{Deserialize, Serialize};

/// Discovery output of a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildManifest {
    /// Every page file, in discovery order.
    #[serde(default)]
    pub page_files: Vec<ManifestPageFile>,
    /// Page config records.
    #[serde(default)]
    pub page_configs: Vec<ManifestPageConfig>,
    /// Code that config values point at.
    #[serde(default)]
    pub imports: Vec<ManifestImport>,
}

/// A bundled hook. The CLI cannot run application code, so calling it
/// returns the recorded `returns` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestImport {
    pub import_path: String,
    pub export_name: String,
    #[serde(default)]
    pub returns: serde_json::Value,
}

impl ManifestImport {
    fn register(self, registry: &mut ImportRegistry) {
        let returns = self.returns;
        let hook = Hook::new(self.export_name.clone(), move |_| {
            let returns = returns.clone();
            async move { anyhow::Ok(returns) }
        });
        registry.register(self.import_path, self.export_name, hook);
    }
}

/// Page file type as written in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFileType {
    Page,
    Client,
    Server,
    Shared,
}

impl From<ManifestFileType> for PageFileType {
    fn from(file_type: ManifestFileType) -> Self {
        match file_type {
            ManifestFileType::Page => Self::Page,
            ManifestFileType::Client => Self::Client,
            ManifestFileType::Server => Self::Server,
            ManifestFileType::Shared => Self::Shared,
        }
    }
}

/// One page file with its exports inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPageFile {
    pub file_path: String,
    /// Page the file belongs to. Missing means every page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    pub file_type: ManifestFileType,
    /// Named exports. Missing means the file has no loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_export: Option<serde_json::Value>,
    /// Loading the file fails with this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

impl ManifestPageFile {
    fn into_page_file(self) -> PageFile {
        let scope = match self.page_id {
            Some(page_id) => PageFileScope::Page(page_id.into()),
            None => PageFileScope::All,
        };
        let file = PageFile::new(self.file_path, scope, self.file_type.into());

        if let Some(message) = self.load_error {
            return file.with_loader(page_file_loader(move || {
                let message = message.clone();
                async move { Err::<FileExports, _>(anyhow::Error::msg(message)) }
            }));
        }

        if self.exports.is_none() && self.default_export.is_none() {
            return file;
        }

        let mut exports = FileExports::new();
        for (name, value) in self.exports.unwrap_or_default() {
            exports = exports.with_export(name, value);
        }
        if let Some(default) = self.default_export {
            exports = exports.with_default(default);
        }
        file.with_exports(exports)
    }
}

/// One page config record with its serialized values inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPageConfig {
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default)]
    pub config_values: Vec<SerializedConfigValue>,
}

impl ManifestPageConfig {
    fn into_runtime(self, imports: Arc<ImportRegistry>) -> PageConfigRuntime {
        let runtime = PageConfigRuntime::new(self.page_id, StaticConfigValues::shared(self.config_values))
            .with_imports(imports);
        match self.route {
            Some(route) => runtime.with_route(route),
            None => runtime,
        }
    }
}

impl BuildManifest {
    /// Read a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest JSON.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build the runtime assets.
    pub fn into_assets(self) -> PageAssets {
        let mut imports = ImportRegistry::new();
        for import in self.imports {
            import.register(&mut imports);
        }
        let imports = Arc::new(imports);

        let page_files = self
            .page_files
            .into_iter()
            .map(ManifestPageFile::into_page_file)
            .collect();
        let page_configs = ConfigValueStore::new(
            self.page_configs
                .into_iter()
                .map(|config| config.into_runtime(Arc::clone(&imports))),
        );
        PageAssets::new(page_files, page_configs)
    }
}
