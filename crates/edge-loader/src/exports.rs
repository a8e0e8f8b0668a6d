//! Exports aggregation.
//!
//! Merges the exports of every loaded page file and the loaded config record
//! into the [`ExportsAddendum`] handed to the renderer.

use std::collections::BTreeMap;
use std::time::Duration;

use edge_config::PageConfigLoaded;
use edge_core::{DefinedAt, DefinedAtFile};
pub use edge_core::{ExportValue, Hook, HookFn};

use crate::page_file::{PageFile, PageFileType};

/// Exports of one loaded file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileExports {
    /// Named exports, in declaration order.
    pub named: Vec<(String, ExportValue)>,
    /// Default export.
    pub default: Option<ExportValue>,
}

impl FileExports {
    /// Create an empty export set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named export.
    pub fn with_export(mut self, name: impl Into<String>, value: impl Into<ExportValue>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Set the default export.
    pub fn with_default(mut self, value: impl Into<ExportValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// One contribution to an export name.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    /// The exported value.
    pub value: ExportValue,
    /// File that contributed it. `None` for internal config values.
    pub file_path: Option<String>,
    /// Definition sites.
    pub defined_at: DefinedAt,
}

/// One contribution to a config name.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    /// The config value.
    pub value: ExportValue,
    /// Definition sites.
    pub defined_at: DefinedAt,
}

/// Everything loaded for one page, merged into the request context.
#[derive(Debug, Clone, Default)]
pub struct ExportsAddendum {
    /// Final value per config name.
    pub config: BTreeMap<String, ExportValue>,
    /// Every contribution per config name, in precedence order (last wins).
    pub config_entries: BTreeMap<String, Vec<ConfigEntry>>,
    /// Final value per export name.
    pub exports: BTreeMap<String, ExportValue>,
    /// Every contribution per export name, in precedence order (last wins).
    pub exports_all: BTreeMap<String, Vec<ExportEntry>>,
    /// Default export of the page's component file.
    pub page_exports: Option<ExportValue>,
    /// Page files that were selected for this page.
    pub loaded_page_files: Vec<PageFile>,
    /// Load time of every selected file that has a loader.
    pub file_load_times: BTreeMap<String, Duration>,
    /// Load time of the page's config record. `None` when the page has none.
    pub config_load_time: Option<Duration>,
}

impl ExportsAddendum {
    /// Contribution of `file_path` to the export `name`.
    pub fn export_from(&self, name: &str, file_path: &str) -> Option<&ExportValue> {
        self.exports_all
            .get(name)?
            .iter()
            .find(|entry| entry.file_path.as_deref() == Some(file_path))
            .map(|entry| &entry.value)
    }
}

/// A page file together with what loading it produced. `exports` and
/// `load_time` are `None` for files without loader.
#[derive(Debug, Clone)]
pub struct LoadedPageFile {
    /// The page file.
    pub file: PageFile,
    /// Its exports.
    pub exports: Option<FileExports>,
    /// How long its loader ran.
    pub load_time: Option<Duration>,
}

/// Merge loaded page files and the loaded config record.
///
/// Precedence follows the order of `files`, not the order in which loads
/// completed: a later file overrides an earlier one, and the config record
/// overrides every file.
pub fn aggregate(files: Vec<LoadedPageFile>, page_config: Option<&PageConfigLoaded>) -> ExportsAddendum {
    let mut addendum = ExportsAddendum::default();

    for loaded in &files {
        if let Some(load_time) = loaded.load_time {
            addendum
                .file_load_times
                .insert(loaded.file.file_path.clone(), load_time);
        }
        let Some(exports) = &loaded.exports else {
            continue;
        };
        let file_path = &loaded.file.file_path;

        for (name, value) in &exports.named {
            let defined_at = vec![DefinedAtFile::new(file_path.clone()).with_export_path([name.clone()])];
            push_contribution(&mut addendum, name, value.clone(), Some(file_path.clone()), defined_at);
        }

        if loaded.file.file_type == PageFileType::Page {
            if let Some(default) = &exports.default {
                addendum.page_exports = Some(default.clone());
            }
        }
    }

    if let Some(page_config) = page_config {
        for (name, config_value) in page_config.config_values() {
            let file_path = config_value.defined_at.first().map(|site| site.file_path.clone());
            push_contribution(
                &mut addendum,
                name,
                config_value.value.clone(),
                file_path,
                config_value.defined_at.clone(),
            );
        }
    }

    addendum.loaded_page_files = files.into_iter().map(|loaded| loaded.file).collect();
    addendum
}

fn push_contribution(
    addendum: &mut ExportsAddendum,
    name: &str,
    value: ExportValue,
    file_path: Option<String>,
    defined_at: DefinedAt,
) {
    addendum.config.insert(name.to_string(), value.clone());
    addendum.exports.insert(name.to_string(), value.clone());

    addendum
        .config_entries
        .entry(name.to_string())
        .or_default()
        .push(ConfigEntry {
            value: value.clone(),
            defined_at: defined_at.clone(),
        });

    addendum
        .exports_all
        .entry(name.to_string())
        .or_default()
        .push(ExportEntry {
            value,
            file_path,
            defined_at,
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use edge_config::{
        ConfigValueStore, ImportRegistry, PageConfigRuntime, SerializedConfigValue, StaticConfigValues,
    };
    use edge_core::Mode;
    use futures::executor::block_on;
    use serde_json::json;

    use crate::page_file::PageFileScope;

    fn loaded(path: &str, file_type: PageFileType, exports: FileExports) -> LoadedPageFile {
        LoadedPageFile {
            file: PageFile::new(path, PageFileScope::All, file_type),
            exports: Some(exports),
            load_time: Some(Duration::from_millis(1)),
        }
    }

    fn loaded_config(values: Vec<SerializedConfigValue>) -> Arc<PageConfigLoaded> {
        let store = ConfigValueStore::new(vec![PageConfigRuntime::new(
            "/pages/index",
            StaticConfigValues::shared(values),
        )]);
        block_on(store.load("/pages/index", Mode::Production)).unwrap().unwrap()
    }

    // === Precedence ===

    #[test]
    fn test_later_file_wins() {
        let files = vec![
            loaded("/a.js", PageFileType::Shared, FileExports::new().with_export("greet", json!("from A"))),
            loaded("/b.js", PageFileType::Shared, FileExports::new().with_export("greet", json!("from B"))),
        ];
        let addendum = aggregate(files, None);

        assert_eq!(addendum.exports["greet"], ExportValue::Value(json!("from B")));
        assert_eq!(addendum.exports_all["greet"].len(), 2);
        assert_eq!(
            addendum.export_from("greet", "/a.js"),
            Some(&ExportValue::Value(json!("from A")))
        );
        assert_eq!(
            addendum.export_from("greet", "/b.js"),
            Some(&ExportValue::Value(json!("from B")))
        );
    }

    #[test]
    fn test_config_record_wins_over_files() {
        let files = vec![loaded(
            "/renderer/+config.js",
            PageFileType::Shared,
            FileExports::new().with_export("title", json!("Legacy")),
        )];
        let config = loaded_config(vec![SerializedConfigValue::inline(
            "title",
            json!("Modern"),
            DefinedAtFile::new("/pages/index/+title.js"),
        )]);
        let addendum = aggregate(files, Some(&*config));

        assert_eq!(addendum.config["title"], ExportValue::Value(json!("Modern")));
        assert_eq!(addendum.exports["title"], ExportValue::Value(json!("Modern")));

        let entries = &addendum.config_entries["title"];
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].defined_at[0].file_path, "/pages/index/+title.js");
        assert_eq!(
            addendum.exports_all["title"][1].file_path.as_deref(),
            Some("/pages/index/+title.js")
        );
    }

    #[test]
    fn test_config_entries_keep_provenance() {
        let config = loaded_config(vec![SerializedConfigValue::inline(
            "Layout",
            json!("Default"),
            DefinedAtFile::new("/renderer/+config.js"),
        )
        .with_defined_at(vec![
            DefinedAtFile::new("/renderer/+config.js").with_export_path(["default", "Layout"]),
            DefinedAtFile::new("/pages/index/+Layout.js"),
        ])]);
        let addendum = aggregate(Vec::new(), Some(&*config));

        assert_eq!(addendum.config["Layout"], ExportValue::Value(json!("Default")));
        assert_eq!(addendum.config_entries["Layout"][0].defined_at.len(), 2);
    }

    // === Page exports ===

    #[test]
    fn test_page_exports_from_page_file() {
        let files = vec![
            loaded("/renderer/+onRenderHtml.js", PageFileType::Server, FileExports::new().with_default(json!("renderer"))),
            loaded("/pages/index/+Page.js", PageFileType::Page, FileExports::new().with_default(json!("IndexPage"))),
        ];
        let addendum = aggregate(files, None);
        assert_eq!(addendum.page_exports, Some(ExportValue::Value(json!("IndexPage"))));
    }

    #[test]
    fn test_default_exports_of_other_files_ignored() {
        let files = vec![loaded(
            "/renderer/+onRenderClient.js",
            PageFileType::Client,
            FileExports::new().with_default(json!("client")),
        )];
        let addendum = aggregate(files, None);
        assert!(addendum.page_exports.is_none());
        assert!(addendum.exports.is_empty());
    }

    // === Empty ===

    #[test]
    fn test_empty_aggregation() {
        let addendum = aggregate(Vec::new(), None);
        assert!(addendum.config.is_empty());
        assert!(addendum.exports.is_empty());
        assert!(addendum.loaded_page_files.is_empty());
    }

    #[test]
    fn test_metadata_files_listed_but_contribute_nothing() {
        let files = vec![LoadedPageFile {
            file: PageFile::new("/pages/index/+route.js", PageFileScope::All, PageFileType::Shared),
            exports: None,
            load_time: None,
        }];
        let addendum = aggregate(files, None);
        assert_eq!(addendum.loaded_page_files.len(), 1);
        assert!(addendum.exports_all.is_empty());
        assert!(addendum.file_load_times.is_empty());
    }

    // === Hooks ===

    #[test]
    fn test_hook_export() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let hook = Hook::new("onRenderHtml", move |arg| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(json!({ "html": format!("<h1>{}</h1>", arg["title"].as_str().unwrap_or("")) }))
            }
        });

        let files = vec![loaded(
            "/renderer/+onRenderHtml.js",
            PageFileType::Server,
            FileExports::new().with_export("onRenderHtml", hook.clone()),
        )];
        let addendum = aggregate(files, None);

        let exported = addendum.exports["onRenderHtml"].as_hook().unwrap();
        assert_eq!(exported, &hook);
        assert_eq!(exported.name(), "onRenderHtml");

        let html = block_on(exported.call(json!({ "title": "Hi" }))).unwrap();
        assert_eq!(html["html"], json!("<h1>Hi</h1>"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_from_config_record() {
        let imports = ImportRegistry::new().with_hook(
            "/renderer/onRenderHtml.js",
            "onRenderHtml",
            Hook::new("onRenderHtml", |arg| async move {
                anyhow::Ok(json!(format!("<title>{}</title>", arg["title"].as_str().unwrap_or(""))))
            }),
        );
        let store = ConfigValueStore::new(vec![PageConfigRuntime::new(
            "/pages/index",
            StaticConfigValues::shared(vec![SerializedConfigValue::import(
                "onRenderHtml",
                "/renderer/onRenderHtml.js",
                "onRenderHtml",
                DefinedAtFile::new("/renderer/+config.js").with_export_path(["default", "onRenderHtml"]),
            )]),
        )
        .with_imports(Arc::new(imports))]);
        let config = block_on(store.load("/pages/index", Mode::Production)).unwrap().unwrap();

        let files = vec![loaded(
            "/renderer/+onRenderHtml.js",
            PageFileType::Server,
            FileExports::new().with_export("onRenderHtml", json!("legacy")),
        )];
        let addendum = aggregate(files, Some(&*config));

        let hook = addendum.config["onRenderHtml"].as_hook().unwrap();
        let html = block_on(hook.call(json!({ "title": "Home" }))).unwrap();
        assert_eq!(html, json!("<title>Home</title>"));
        assert!(addendum.exports["onRenderHtml"].is_hook());
        assert_eq!(addendum.exports_all["onRenderHtml"].len(), 2);
    }

    // === Timing ===

    #[test]
    fn test_load_times_of_loaded_files() {
        let files = vec![
            loaded("/a.js", PageFileType::Shared, FileExports::new()),
            LoadedPageFile {
                file: PageFile::new("/b.js", PageFileScope::All, PageFileType::Shared),
                exports: None,
                load_time: None,
            },
        ];
        let addendum = aggregate(files, None);
        assert_eq!(addendum.file_load_times.len(), 1);
        assert_eq!(addendum.file_load_times["/a.js"], Duration::from_millis(1));
        assert!(addendum.config_load_time.is_none());
    }
}
