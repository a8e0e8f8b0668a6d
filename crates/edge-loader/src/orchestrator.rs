//! Runtime loading orchestration.
//!
//! Resolves the page config record, loads config values and page files
//! concurrently, and aggregates the result. The client variant additionally
//! recognizes stale-asset fetch failures.

use std::sync::Arc;
use std::time::Instant;

use edge_config::{ConfigValueStore, LoadResult};
use edge_core::{Environment, FrameworkConfig, Mode};
use futures::future::try_join;

use crate::exports::{aggregate, ExportsAddendum};
use crate::fetch_error::FetchFailurePatterns;
use crate::page_file::{filter_applicable, filter_for_environment, load_page_files, PageFile};

/// Everything discovery produced for the project.
#[derive(Debug, Default)]
pub struct PageAssets {
    /// Every page file, in discovery order.
    pub page_files_all: Vec<PageFile>,
    /// Page config records.
    pub page_configs: ConfigValueStore,
}

impl PageAssets {
    /// Create from discovery output.
    pub fn new(page_files_all: Vec<PageFile>, page_configs: ConfigValueStore) -> Self {
        Self {
            page_files_all,
            page_configs,
        }
    }
}

/// Loads the exports of a page.
///
/// Holds no per-page state: all caching lives in the [`ConfigValueStore`].
#[derive(Debug, Clone)]
pub struct PageLoader {
    assets: Arc<PageAssets>,
    mode: Mode,
    fetch_failures: FetchFailurePatterns,
}

impl PageLoader {
    /// Create a loader for `assets` using `config`.
    pub fn new(assets: Arc<PageAssets>, config: &FrameworkConfig) -> Self {
        Self {
            assets,
            mode: config.mode,
            fetch_failures: FetchFailurePatterns::from_config(config),
        }
    }

    /// Discovery output this loader serves.
    pub fn assets(&self) -> &Arc<PageAssets> {
        &self.assets
    }

    /// Development or production.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stale-asset phrasings in use.
    pub fn fetch_failures(&self) -> &FetchFailurePatterns {
        &self.fetch_failures
    }

    /// Load a page in the browser.
    ///
    /// A failure whose message matches a known fetch-failure phrasing comes
    /// back as [`LoadError::StaleAsset`](edge_config::LoadError::StaleAsset),
    /// whichever of the config or file loads raised it.
    pub async fn load_page_files_client_side(&self, page_id: &str) -> LoadResult<ExportsAddendum> {
        self.load_page_exports(page_id, Environment::Client)
            .await
            .map_err(|err| {
                let err = self.fetch_failures.classify(err);
                if err.is_stale_asset() {
                    tracing::warn!(page_id, error = %err, "stale static assets, reload required");
                }
                err
            })
    }

    /// Load a page on the server. Failures are returned as-is.
    pub async fn load_page_files_server_side(&self, page_id: &str) -> LoadResult<ExportsAddendum> {
        self.load_page_exports(page_id, Environment::Server).await
    }

    /// Dispatch on `env`.
    pub async fn load(&self, page_id: &str, env: Environment) -> LoadResult<ExportsAddendum> {
        match env {
            Environment::Client => self.load_page_files_client_side(page_id).await,
            Environment::Server => self.load_page_files_server_side(page_id).await,
        }
    }

    async fn load_page_exports(&self, page_id: &str, env: Environment) -> LoadResult<ExportsAddendum> {
        let page_files = filter_for_environment(
            filter_applicable(&self.assets.page_files_all, page_id),
            env,
        );

        tracing::debug!(
            page_id,
            %env,
            files = page_files.len(),
            "loading page"
        );

        let load_config = async {
            let start = Instant::now();
            let loaded = self.assets.page_configs.load(page_id, self.mode).await?;
            LoadResult::Ok(loaded.map(|loaded| (loaded, start.elapsed())))
        };

        let (page_config, loaded_files) = try_join(load_config, load_page_files(page_files))
            .await
            .map_err(|err| {
                tracing::debug!(page_id, %env, error = %err, "page load failed");
                err
            })?;

        let Some((page_config, config_load_time)) = page_config else {
            tracing::trace!(page_id, "page has no config record");
            return Ok(aggregate(loaded_files, None));
        };

        let mut addendum = aggregate(loaded_files, Some(&*page_config));
        addendum.config_load_time = Some(config_load_time);
        Ok(addendum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use edge_config::{
        config_values_loader, is_reserved_config_name, LoadError, PageConfigRuntime,
        SerializedConfigValue, StaticConfigValues,
    };
    use edge_core::DefinedAtFile;
    use futures::executor::block_on;
    use serde_json::json;

    use crate::exports::{ExportValue, FileExports};
    use crate::fetch_error::is_error_fetching_static_assets;
    use crate::page_file::{page_file_loader, PageFileScope, PageFileType};

    fn index_files() -> Vec<PageFile> {
        vec![
            PageFile::new("/renderer/+onRenderClient.js", PageFileScope::All, PageFileType::Client)
                .with_exports(FileExports::new().with_export("onRenderClient", json!("client-renderer"))),
            PageFile::new("/renderer/+onRenderHtml.js", PageFileScope::All, PageFileType::Server)
                .with_exports(FileExports::new().with_export("onRenderHtml", json!("server-renderer"))),
            PageFile::new("/pages/index/+Page.js", PageFileScope::Page("/pages/index".into()), PageFileType::Page)
                .with_exports(FileExports::new().with_default(json!("IndexPage"))),
        ]
    }

    fn index_config(calls: Arc<AtomicUsize>) -> PageConfigRuntime {
        let loader = config_values_loader(move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(vec![SerializedConfigValue::inline(
                    "title",
                    json!("Home"),
                    DefinedAtFile::new("/pages/index/+title.js"),
                )])
            }
        });
        PageConfigRuntime::new("/pages/index", loader).with_route("/")
    }

    fn loader_for(files: Vec<PageFile>, configs: Vec<PageConfigRuntime>, mode: Mode) -> PageLoader {
        let config = FrameworkConfig {
            mode,
            ..FrameworkConfig::default()
        };
        let assets = PageAssets::new(files, ConfigValueStore::new(configs));
        PageLoader::new(Arc::new(assets), &config)
    }

    // === Happy path ===

    #[test]
    fn test_client_side_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = loader_for(index_files(), vec![index_config(calls)], Mode::Production);

        let addendum = block_on(loader.load_page_files_client_side("/pages/index")).unwrap();
        assert_eq!(addendum.config["title"], ExportValue::Value(json!("Home")));
        assert!(addendum.exports.contains_key("onRenderClient"));
        assert!(!addendum.exports.contains_key("onRenderHtml"));
        assert_eq!(addendum.page_exports, Some(ExportValue::Value(json!("IndexPage"))));
        assert_eq!(addendum.loaded_page_files.len(), 2);
    }

    #[test]
    fn test_server_side_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = loader_for(index_files(), vec![index_config(calls)], Mode::Production);

        let addendum = block_on(loader.load("/pages/index", Environment::Server)).unwrap();
        assert!(addendum.exports.contains_key("onRenderHtml"));
        assert!(!addendum.exports.contains_key("onRenderClient"));
        assert_eq!(addendum.config["title"], ExportValue::Value(json!("Home")));
    }

    #[test]
    fn test_page_without_config_record() {
        let loader = loader_for(index_files(), Vec::new(), Mode::Production);
        let addendum = block_on(loader.load_page_files_server_side("/pages/index")).unwrap();
        assert!(addendum.config_entries.contains_key("onRenderHtml"));
        assert!(!addendum.config.contains_key("title"));
    }

    #[test]
    fn test_load_times() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = loader_for(index_files(), vec![index_config(calls)], Mode::Production);
        let addendum = block_on(loader.load_page_files_server_side("/pages/index")).unwrap();
        assert!(addendum.config_load_time.is_some());
        assert_eq!(addendum.file_load_times.len(), 2);

        let loader = loader_for(index_files(), Vec::new(), Mode::Production);
        let addendum = block_on(loader.load_page_files_server_side("/pages/index")).unwrap();
        assert!(addendum.config_load_time.is_none());
    }

    #[test]
    fn test_empty_resolution() {
        let loader = loader_for(Vec::new(), Vec::new(), Mode::Production);
        let addendum = block_on(loader.load_page_files_client_side("/pages/missing")).unwrap();
        assert!(addendum.config.is_empty());
        assert!(addendum.exports.is_empty());
        assert!(addendum.page_exports.is_none());
        assert!(addendum.loaded_page_files.is_empty());
    }

    // === Caching ===

    #[test]
    fn test_config_values_cached_in_production() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = loader_for(index_files(), vec![index_config(calls.clone())], Mode::Production);

        block_on(loader.load_page_files_client_side("/pages/index")).unwrap();
        block_on(loader.load_page_files_server_side("/pages/index")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(loader.assets().page_configs.find("/pages/index").unwrap().is_all_loaded());
    }

    #[test]
    fn test_config_values_reloaded_in_development() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = loader_for(index_files(), vec![index_config(calls.clone())], Mode::Development);

        block_on(loader.load_page_files_client_side("/pages/index")).unwrap();
        block_on(loader.load_page_files_client_side("/pages/index")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // === Failures ===

    fn failing_page(message: &'static str) -> PageFile {
        PageFile::new("/pages/index/+Page.js", PageFileScope::Page("/pages/index".into()), PageFileType::Page)
            .with_loader(page_file_loader(move || async move {
                Err::<FileExports, _>(anyhow::anyhow!(message))
            }))
    }

    #[test]
    fn test_client_fetch_failure_is_stale_asset() {
        let loader = loader_for(
            vec![failing_page("Failed to fetch dynamically imported module: /assets/Page-1a2b.js")],
            Vec::new(),
            Mode::Production,
        );
        let err = block_on(loader.load_page_files_client_side("/pages/index")).unwrap_err();
        assert!(is_error_fetching_static_assets(&err));
    }

    #[test]
    fn test_client_config_fetch_failure_is_stale_asset() {
        let loader_fn = config_values_loader(|| async {
            Err::<Vec<SerializedConfigValue>, _>(anyhow::anyhow!(
                "TypeError: Importing a module script failed."
            ))
        });
        let loader = loader_for(
            Vec::new(),
            vec![PageConfigRuntime::new("/pages/index", loader_fn)],
            Mode::Production,
        );
        let err = block_on(loader.load_page_files_client_side("/pages/index")).unwrap_err();
        assert!(is_error_fetching_static_assets(&err));
    }

    #[test]
    fn test_client_other_failure_propagates() {
        let loader = loader_for(
            vec![failing_page("TypeError: cannot read property of undefined")],
            Vec::new(),
            Mode::Production,
        );
        let err = block_on(loader.load_page_files_client_side("/pages/index")).unwrap_err();
        assert!(!is_error_fetching_static_assets(&err));
        assert!(matches!(err, LoadError::Loader(_)));
    }

    #[test]
    fn test_server_never_classifies() {
        let loader = loader_for(
            vec![failing_page("Failed to fetch dynamically imported module: /assets/Page.js")],
            Vec::new(),
            Mode::Production,
        );
        let err = block_on(loader.load_page_files_server_side("/pages/index")).unwrap_err();
        assert!(matches!(err, LoadError::Loader(_)));
    }

    #[test]
    fn test_configured_phrasing() {
        let config = FrameworkConfig {
            assets: edge_core::AssetsConfig {
                stale_asset_patterns: vec!["ChunkLoadError".to_string()],
            },
            ..FrameworkConfig::default()
        };
        let assets = PageAssets::new(vec![failing_page("ChunkLoadError: chunk 3 failed")], ConfigValueStore::default());
        let loader = PageLoader::new(Arc::new(assets), &config);

        let err = block_on(loader.load_page_files_client_side("/pages/index")).unwrap_err();
        assert!(is_error_fetching_static_assets(&err));
    }

    #[test]
    fn test_reserved_config_name_fails_load() {
        let values = vec![SerializedConfigValue::inline(
            "isAllLoaded",
            json!(false),
            DefinedAtFile::new("/pages/index/+config.js"),
        )];
        assert!(is_reserved_config_name("isAllLoaded"));
        let loader = loader_for(
            Vec::new(),
            vec![PageConfigRuntime::new("/pages/index", StaticConfigValues::shared(values))],
            Mode::Production,
        );
        let err = block_on(loader.load_page_files_client_side("/pages/index")).unwrap_err();
        assert!(matches!(err, LoadError::ReservedConfigName { .. }));
    }
}
