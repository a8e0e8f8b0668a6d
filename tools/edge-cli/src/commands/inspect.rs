//! Page inspection: load one page from a build manifest and report what it
//! resolves to.

use std::sync::Arc;

use anyhow::Result;
use edge_config::LoadError;
use edge_core::{
    format_defined_at, Environment, FrameworkConfig, Mode, RequestContext, SentenceBegin,
};
use edge_loader::{is_error_fetching_static_assets, ExportValue, PageAssets, PageContext, PageLoader};
use edge_observability::LoadMetrics;
use serde::Serialize;

use super::InspectArgs;
use crate::context::Context;
use crate::manifest::BuildManifest;
use crate::output::format_micros;

/// Final value of one config, with where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub name: String,
    pub value: serde_json::Value,
    pub defined_at: String,
    /// Number of contributions that were overridden.
    pub overridden: usize,
}

/// Winning contribution of one export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Everything `edge inspect` shows.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub page_id: String,
    pub environment: String,
    pub mode: Mode,
    pub files: Vec<String>,
    pub config: Vec<ConfigReport>,
    pub exports: Vec<ExportReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_exports: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<LoadMetrics>,
}

/// Run the inspect command.
pub async fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let manifest_path = ctx.resolve_path(&args.manifest.to_string_lossy());
    ctx.output.debug(&format!("Reading manifest {}", manifest_path.display()));
    let manifest = BuildManifest::load(&manifest_path)?;

    let mut config = ctx.config.clone();
    if args.dev {
        config.mode = Mode::Development;
    }

    let report = match inspect_page(manifest.into_assets(), &args.page_id, args.env.into(), &config).await {
        Ok(report) => report,
        Err(err) if is_error_fetching_static_assets(&err) => {
            ctx.output.warn("Static assets are stale; a full page reload is required");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    print_report(&report, ctx);
    Ok(())
}

/// Load `page_id` and build the report.
pub async fn inspect_page(
    assets: PageAssets,
    page_id: &str,
    env: Environment,
    config: &FrameworkConfig,
) -> Result<InspectReport, LoadError> {
    let loader = PageLoader::new(Arc::new(assets), config);
    let request = RequestContext::new(page_id, env, config.mode);
    let mut page = PageContext::new(request, page_id);

    let addendum = page.load_exports(&loader).await?;

    let config_reports = addendum
        .config_entries
        .iter()
        .filter_map(|(name, entries)| {
            let last = entries.last()?;
            Some(ConfigReport {
                name: name.clone(),
                value: to_json(&last.value),
                defined_at: format_defined_at(SentenceBegin::Config, name, &last.defined_at),
                overridden: entries.len() - 1,
            })
        })
        .collect();

    let export_reports = addendum
        .exports_all
        .iter()
        .filter_map(|(name, entries)| {
            let last = entries.last()?;
            Some(ExportReport {
                name: name.clone(),
                file_path: last.file_path.clone(),
            })
        })
        .collect();

    let files = addendum
        .loaded_page_files
        .iter()
        .map(|file| file.file_path.clone())
        .collect();
    let page_exports = addendum.page_exports.as_ref().map(to_json);

    Ok(InspectReport {
        page_id: page_id.to_string(),
        environment: env.to_string(),
        mode: config.mode,
        files,
        config: config_reports,
        exports: export_reports,
        page_exports,
        metrics: page.metrics().cloned(),
    })
}

fn to_json(value: &ExportValue) -> serde_json::Value {
    match value {
        ExportValue::Value(value) => value.clone(),
        ExportValue::Hook(hook) => serde_json::Value::String(format!("[hook {}]", hook.name())),
    }
}

fn print_report(report: &InspectReport, ctx: &Context) {
    ctx.output.header(&format!("Page {} ({}, {})", report.page_id, report.environment, report.mode));

    ctx.output.info("Files:");
    if report.files.is_empty() {
        ctx.output.list_item("(none)");
    }
    for file in &report.files {
        ctx.output.list_item(file);
    }

    ctx.output.info("Config:");
    for config in &report.config {
        let overridden = match config.overridden {
            0 => String::new(),
            n => format!(" (overrides {})", n),
        };
        ctx.output.kv(&config.name, &format!("{}{}", config.value, overridden));
        ctx.output.debug(&config.defined_at);
    }

    ctx.output.info("Exports:");
    for export in &report.exports {
        let from = export.file_path.as_deref().unwrap_or("internal");
        ctx.output.kv(&export.name, from);
    }

    if let Some(page_exports) = &report.page_exports {
        ctx.output.kv("Page", &page_exports.to_string());
    }

    if let Some(metrics) = &report.metrics {
        ctx.output.success(&format!("Loaded in {}", format_micros(metrics.total_duration_us)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::tests::MANIFEST;
    use edge_observability::{ConfigCacheStatus, LoadOutcome};

    fn assets() -> PageAssets {
        BuildManifest::parse(MANIFEST).unwrap().into_assets()
    }

    #[tokio::test]
    async fn test_inspect_server_side() {
        let report = inspect_page(assets(), "/pages/index", Environment::Server, &FrameworkConfig::default())
            .await
            .unwrap();

        assert_eq!(report.environment, "server");
        assert_eq!(
            report.files,
            vec![
                "/renderer/+onRenderHtml.js",
                "/renderer/+config.js",
                "/pages/index/+Page.js",
                "/pages/index/+route.js",
            ]
        );
        assert_eq!(report.page_exports, Some(serde_json::json!("IndexPage")));

        let title = report.config.iter().find(|c| c.name == "title").unwrap();
        assert_eq!(title.value, serde_json::json!("Home"));
        assert_eq!(title.overridden, 1);
        assert_eq!(title.defined_at, "Config title defined at /pages/index/+title.js");

        let layout = report.config.iter().find(|c| c.name == "Layout").unwrap();
        assert_eq!(
            layout.defined_at,
            "Config Layout defined at /renderer/+config.js > export default { Layout }"
        );

        let on_render_html = report.config.iter().find(|c| c.name == "onRenderHtml").unwrap();
        assert_eq!(on_render_html.value, serde_json::json!("[hook onRenderHtml]"));
        assert_eq!(on_render_html.overridden, 1);

        assert!(report.exports.iter().any(|e| e.name == "onRenderHtml"));
        assert!(!report.exports.iter().any(|e| e.name == "onRenderClient"));

        let metrics = report.metrics.unwrap();
        assert_eq!(metrics.outcome, LoadOutcome::Success);
        assert_eq!(metrics.config_cache, Some(ConfigCacheStatus::Miss));
        assert!(metrics.time_to_config_us.is_some());
        assert_eq!(metrics.files.len(), 3);
        assert!(!metrics.files.contains_key("/pages/index/+route.js"));
    }

    #[tokio::test]
    async fn test_inspect_client_side() {
        let report = inspect_page(assets(), "/pages/index", Environment::Client, &FrameworkConfig::default())
            .await
            .unwrap();
        assert!(report.exports.iter().any(|e| e.name == "onRenderClient"));
        assert!(!report.files.iter().any(|f| f == "/renderer/+onRenderHtml.js"));
    }

    #[tokio::test]
    async fn test_inspect_page_without_config_record() {
        let report = inspect_page(assets(), "/pages/contact", Environment::Server, &FrameworkConfig::default())
            .await
            .unwrap();
        let title = report.config.iter().find(|c| c.name == "title").unwrap();
        assert_eq!(title.value, serde_json::json!("Shop"));
        assert!(report.page_exports.is_none());

        let metrics = report.metrics.unwrap();
        assert_eq!(metrics.config_cache, Some(ConfigCacheStatus::NoRecord));
        assert!(metrics.time_to_config_us.is_none());
    }

    #[tokio::test]
    async fn test_inspect_stale_asset() {
        let err = inspect_page(assets(), "/pages/about", Environment::Client, &FrameworkConfig::default())
            .await
            .unwrap_err();
        assert!(is_error_fetching_static_assets(&err));

        let err = inspect_page(assets(), "/pages/about", Environment::Server, &FrameworkConfig::default())
            .await
            .unwrap_err();
        assert!(!is_error_fetching_static_assets(&err));
    }
}
