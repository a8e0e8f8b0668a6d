//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use edge_core::FrameworkConfig;

use crate::output::Output;

/// Config file names, in lookup order.
const CONFIG_NAMES: [&str; 3] = ["edge.toml", ".edge.toml", "edge.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Resolved framework configuration.
    pub config: FrameworkConfig,
    /// File the configuration was read from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file and environment.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(resolve_path(&cwd, path)),
            // Try to find config in current directory or parent directories
            None => find_config(&cwd),
        };

        let config = match &config_path {
            Some(path) => FrameworkConfig::load(path)?,
            None => FrameworkConfig::default(),
        };
        let config = config
            .resolve_with_env()
            .context("Failed to resolve configuration")?;

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve_path(&self.cwd, path)
    }
}

/// Find a config file in the directory tree above `start`.
fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

fn resolve_path(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let cwd = Path::new("/work/app");
        assert_eq!(resolve_path(cwd, "dist/manifest.json"), PathBuf::from("/work/app/dist/manifest.json"));
        assert_eq!(resolve_path(cwd, "/tmp/manifest.json"), PathBuf::from("/tmp/manifest.json"));
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = std::env::temp_dir().join(format!("edge-cli-find-{}", std::process::id()));
        let nested = root.join("pages").join("index");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("edge.toml"), "mode = \"development\"\n").unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, root.join("edge.toml"));

        let config = FrameworkConfig::load(&found).unwrap();
        assert!(config.mode.is_dev());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
