//! Page loading lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases of loading one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    /// Loading started.
    Start,
    /// Config values are materialized.
    ConfigLoaded,
    /// A page file finished loading.
    FileLoaded(String),
    /// Exports were aggregated and handed to the renderer.
    Completion,
    /// Loading failed.
    Error(String),
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record the timing mark of a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LoadPhase) {
        match phase {
            LoadPhase::Start => self.mark("load_start"),
            LoadPhase::ConfigLoaded => self.mark("config_loaded"),
            LoadPhase::FileLoaded(path) => self.mark(&format!("file_{}_loaded", path)),
            LoadPhase::Completion => self.mark("load_complete"),
            LoadPhase::Error(_) => self.mark("load_error"),
        }
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start to a named mark.
    pub fn since_start(&self, mark: &str) -> Option<Duration> {
        self.marks.get(mark).map(|t| t.duration_since(self.start))
    }

    /// Time until config values were available.
    pub fn time_to_config(&self) -> Option<Duration> {
        self.since_start("config_loaded")
    }

    /// Time until the page was fully loaded.
    pub fn time_to_complete(&self) -> Option<Duration> {
        self.since_start("load_complete")
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a lifecycle phase occurs.
    fn on_phase(&self, phase: LoadPhase, elapsed: Duration);
}
