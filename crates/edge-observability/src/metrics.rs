//! Page load metrics.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use edge_core::{Environment, RequestId};
use serde::{Deserialize, Serialize};

/// How config values were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigCacheStatus {
    /// Served from the loaded record.
    Hit,
    /// The bulk loader ran.
    Miss,
    /// The page has no config record.
    NoRecord,
}

/// Outcome of a page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadOutcome {
    Success,
    /// Client must reload to pick up the current build.
    StaleAsset,
    Failed,
}

/// Metrics for a single page load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadMetrics {
    /// Request ID for correlation.
    pub request_id: String,
    /// Page that was loaded.
    pub page_id: String,
    /// Environment the load ran in.
    pub environment: String,
    /// Config value cache status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_cache: Option<ConfigCacheStatus>,
    /// Time the page's config record took to load (microseconds). Missing
    /// when the page has no record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_config_us: Option<u64>,
    /// Files that were loaded, with their own load time (microseconds). Files
    /// without loader are not listed.
    pub files: BTreeMap<String, u64>,
    /// Total duration (microseconds).
    pub total_duration_us: u64,
    /// Outcome.
    pub outcome: LoadOutcome,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collector for page load metrics.
#[derive(Debug)]
pub struct LoadMetricsCollector {
    request_id: RequestId,
    page_id: String,
    environment: Environment,
    start: Instant,
    config_cache: Option<ConfigCacheStatus>,
    config_load_time: Option<Duration>,
    files: BTreeMap<String, Duration>,
}

impl LoadMetricsCollector {
    /// Start collecting for one page load.
    pub fn new(request_id: RequestId, page_id: impl Into<String>, environment: Environment) -> Self {
        Self {
            request_id,
            page_id: page_id.into(),
            environment,
            start: Instant::now(),
            config_cache: None,
            config_load_time: None,
            files: BTreeMap::new(),
        }
    }

    /// Record how config values will be obtained.
    pub fn record_config_cache(&mut self, status: ConfigCacheStatus) {
        self.config_cache = Some(status);
    }

    /// Record how long the config record took to load.
    pub fn record_config_loaded(&mut self, load_time: Duration) {
        self.config_load_time = Some(load_time);
    }

    /// Record how long a page file took to load.
    pub fn record_file(&mut self, file_path: &str, load_time: Duration) {
        self.files.insert(file_path.to_string(), load_time);
    }

    /// Finalize and return the metrics.
    pub fn finalize(self, outcome: LoadOutcome, error: Option<String>) -> LoadMetrics {
        let start = self.start;

        LoadMetrics {
            request_id: self.request_id.to_string(),
            page_id: self.page_id,
            environment: self.environment.to_string(),
            config_cache: self.config_cache,
            time_to_config_us: self
                .config_load_time
                .map(|t| t.as_micros() as u64),
            files: self
                .files
                .into_iter()
                .map(|(path, at)| (path, at.as_micros() as u64))
                .collect(),
            total_duration_us: start.elapsed().as_micros() as u64,
            outcome,
            error,
        }
    }

    /// Get total elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl LoadMetrics {
    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Page {} ({}) request {}",
            self.page_id, self.environment, self.request_id
        ));

        let cache = match self.config_cache {
            Some(ConfigCacheStatus::Hit) => "cached",
            Some(ConfigCacheStatus::Miss) => "loaded",
            Some(ConfigCacheStatus::NoRecord) => "none",
            None => "unknown",
        };
        match self.time_to_config_us {
            Some(us) => lines.push(format!("  Config: {} in {}us ({:.2}ms)", cache, us, us as f64 / 1000.0)),
            None => lines.push(format!("  Config: {}", cache)),
        }

        if !self.files.is_empty() {
            lines.push("  Files:".to_string());
            for (path, us) in &self.files {
                lines.push(format!("    {}: {}us", path, us));
            }
        }

        let outcome = match self.outcome {
            LoadOutcome::Success => "ok".to_string(),
            LoadOutcome::StaleAsset => "stale assets, reload required".to_string(),
            LoadOutcome::Failed => format!("failed: {}", self.error.as_deref().unwrap_or("unknown error")),
        };
        lines.push(format!(
            "  Total: {}us ({:.2}ms) - {}",
            self.total_duration_us,
            self.total_duration_us as f64 / 1000.0,
            outcome
        ));

        lines.join("\n")
    }
}
