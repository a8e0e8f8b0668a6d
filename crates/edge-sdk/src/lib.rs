//! Public SDK for page config resolution and loading.
//!
//! This crate re-exports all functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! async fn render(request: RequestContext, page_id: &str, loader: &PageLoader) -> Result<Html> {
//!     let mut page = PageContext::new(request, page_id);
//!     match page.load_exports(loader).await {
//!         Ok(_) => {}
//!         Err(err) if is_error_fetching_static_assets(&err) => return Ok(full_reload()),
//!         Err(err) => return Err(err.into()),
//!     }
//!
//!     let title = page.config("title");
//!     render_page(page.exports(), title)
//! }
//! ```

pub use edge_config;
pub use edge_core;
pub use edge_loader;
pub use edge_observability;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_config::*;
    pub use edge_core::*;
    pub use edge_loader::*;
    pub use edge_observability::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_prelude_end_to_end() {
        let files = vec![
            PageFile::new("/renderer/+onRenderHtml.js", PageFileScope::All, PageFileType::Server)
                .with_exports(FileExports::new().with_export("onRenderHtml", json!("renderer"))),
            PageFile::new("/pages/index/+Page.js", PageFileScope::Page("/pages/index".into()), PageFileType::Page)
                .with_exports(FileExports::new().with_default(json!("IndexPage"))),
        ];
        let configs = vec![PageConfigRuntime::new(
            "/pages/index",
            StaticConfigValues::shared(vec![SerializedConfigValue::inline(
                "title",
                json!("Home"),
                DefinedAtFile::new("/pages/index/+title.js"),
            )]),
        )];
        let assets = Arc::new(PageAssets::new(files, ConfigValueStore::new(configs)));
        let loader = PageLoader::new(assets, &FrameworkConfig::default());

        let request = RequestContext::new("/", Environment::Server, Mode::Production);
        let mut page = PageContext::new(request, "/pages/index")
            .with_logger(StructuredLogger::new(RequestId::from_string("req")).with_min_level(LogLevel::Error));
        block_on(page.load_exports(&loader)).unwrap();

        assert_eq!(page.config("title"), Some(&ExportValue::Value(json!("Home"))));
        assert_eq!(page.export("onRenderHtml"), Some(&ExportValue::Value(json!("renderer"))));
        assert_eq!(
            page.exports().unwrap().page_exports,
            Some(ExportValue::Value(json!("IndexPage")))
        );
    }
}
