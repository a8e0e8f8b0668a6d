//! Framework configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults (port 3000, host `0.0.0.0` inside Docker or CI),
//! 2. the config file (`edge.toml` / `edge.json`),
//! 3. the `EDGE_CONFIG` environment variable (a JSON object, deep-merged),
//! 4. the `EDGE_MODE` environment variable.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable holding a JSON object merged over the file config.
pub const CONFIG_ENV_VAR: &str = "EDGE_CONFIG";

/// Environment variable selecting the mode (`development` / `production`).
pub const MODE_ENV_VAR: &str = "EDGE_MODE";

/// Default port for both the dev server and preview.
pub const DEFAULT_PORT: u16 = 3000;

/// Errors raised while resolving the framework configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("{var} must be a JSON object: {reason}")]
    EnvVar { var: &'static str, reason: String },

    #[error("unknown mode '{0}' (expected 'development' or 'production')")]
    UnknownMode(String),
}

/// Development or production.
///
/// In development the underlying sources can change between two requests, so
/// loaded config values are never treated as final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    /// Whether this is development mode.
    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Parse a mode name (`dev` and `prod` are accepted as well).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Listen address of the dev server or preview server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port. Defaults to 3000 when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Host. Defaults to `0.0.0.0` inside Docker or CI when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl ServerConfig {
    /// Effective port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

/// Static asset handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Extra error phrasings that identify a failed dynamic chunk fetch,
    /// appended to the built-in table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_asset_patterns: Vec<String>,
}

/// Framework configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Development or production.
    #[serde(default)]
    pub mode: Mode,
    /// Dev server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Preview server.
    #[serde(default)]
    pub preview: ServerConfig,
    /// Static asset handling.
    #[serde(default)]
    pub assets: AssetsConfig,
}

impl FrameworkConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        Self::parse(&content, is_json_path(path)).map_err(|reason| ConfigError::Parse {
            path: display,
            reason,
        })
    }

    fn parse(content: &str, json: bool) -> Result<Self, String> {
        if json {
            serde_json::from_str(content).map_err(|e| e.to_string())
        } else {
            toml::from_str(content).map_err(|e| e.to_string())
        }
    }

    /// Apply `EDGE_CONFIG` / `EDGE_MODE` from the process environment and fill
    /// in the defaults the user left unset.
    pub fn resolve_with_env(self) -> Result<Self, ConfigError> {
        let host_env = HostEnvironment::detect();
        self.resolve(
            std::env::var(CONFIG_ENV_VAR).ok().as_deref(),
            std::env::var(MODE_ENV_VAR).ok().as_deref(),
            host_env,
        )
    }

    /// Same as [`resolve_with_env`](Self::resolve_with_env) with explicit inputs.
    pub fn resolve(
        self,
        config_env: Option<&str>,
        mode_env: Option<&str>,
        host_env: HostEnvironment,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_env.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => self.merge_json(raw)?,
            None => self,
        };

        if let Some(mode) = mode_env.map(str::trim).filter(|s| !s.is_empty()) {
            config.mode = Mode::parse(mode)?;
        }

        config.apply_defaults(host_env);
        Ok(config)
    }

    fn merge_json(self, raw: &str) -> Result<Self, ConfigError> {
        let env_err = |reason: String| ConfigError::EnvVar {
            var: CONFIG_ENV_VAR,
            reason,
        };

        let overrides: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| env_err(e.to_string()))?;
        if !overrides.is_object() {
            return Err(env_err(format!("got {}", overrides)));
        }

        let mut base = serde_json::to_value(&self).map_err(|e| env_err(e.to_string()))?;
        deep_merge(&mut base, overrides);
        serde_json::from_value(base).map_err(|e| env_err(e.to_string()))
    }

    // Defaults never override a value the user set.
    fn apply_defaults(&mut self, host_env: HostEnvironment) {
        for server in [&mut self.server, &mut self.preview] {
            if server.port.is_none() {
                server.port = Some(DEFAULT_PORT);
            }
            if server.host.is_none() && (host_env.docker || host_env.ci) {
                server.host = Some("0.0.0.0".to_string());
            }
        }
    }
}

/// Facts about the host that change default settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Running inside a Docker/Podman container.
    pub docker: bool,
    /// Running in CI (`CI` is set).
    pub ci: bool,
}

impl HostEnvironment {
    /// Detect from the current process.
    pub fn detect() -> Self {
        Self {
            docker: Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists(),
            ci: std::env::var_os("CI").is_some(),
        }
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

fn deep_merge(base: &mut serde_json::Value, overrides: serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                deep_merge(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (base, value) => *base = value,
    }
}
