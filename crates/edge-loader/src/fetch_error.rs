//! Stale-asset detection.
//!
//! After a redeploy, a browser running the previous build asks for chunk
//! names that no longer exist. Browsers and bundlers report this with
//! differently worded errors, so detection is a substring match against a
//! table of known phrasings.

use edge_config::LoadError;
use edge_core::FrameworkConfig;

/// Known phrasings of a failed dynamic module fetch.
pub const FAILED_TO_FETCH_MESSAGES: &[&str] = &[
    // Chromium
    "Failed to fetch dynamically imported module",
    // Firefox
    "error loading dynamically imported module",
    // Safari
    "Importing a module script failed",
    // Safari, bare specifiers
    "error resolving module specifier",
    // Dev server
    "failed to resolve module",
];

/// Table of error phrasings that identify a stale-asset fetch failure.
///
/// Matching is a case-insensitive substring test against the full error chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailurePatterns {
    patterns: Vec<String>,
}

impl Default for FetchFailurePatterns {
    fn default() -> Self {
        Self {
            patterns: FAILED_TO_FETCH_MESSAGES
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }
}

impl FetchFailurePatterns {
    /// Built-in table plus extra phrasings.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for pattern in extra {
            let pattern = pattern.as_ref().trim().to_lowercase();
            if !pattern.is_empty() && !table.patterns.contains(&pattern) {
                table.patterns.push(pattern);
            }
        }
        table
    }

    /// Built-in table plus `assets.stale_asset_patterns`.
    pub fn from_config(config: &FrameworkConfig) -> Self {
        Self::with_extra(&config.assets.stale_asset_patterns)
    }

    /// Number of phrasings.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `message` contains a known phrasing.
    pub fn matches(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.patterns.iter().any(|p| message.contains(p.as_str()))
    }

    /// Whether the cause of a loader failure contains a known phrasing.
    pub fn is_fetch_error(&self, err: &anyhow::Error) -> bool {
        self.matches(&format!("{err:#}"))
    }

    /// Re-tag a loader failure as [`LoadError::StaleAsset`] when it matches.
    /// Anything else is returned unchanged.
    pub fn classify(&self, err: LoadError) -> LoadError {
        match err {
            LoadError::Loader(cause) if self.is_fetch_error(&cause) => LoadError::StaleAsset(cause),
            other => other,
        }
    }
}

/// Whether `err` means the client must reload to pick up the current build.
pub fn is_error_fetching_static_assets(err: &LoadError) -> bool {
    err.is_stale_asset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_builtin_phrasings() {
        let table = FetchFailurePatterns::default();
        assert_eq!(table.len(), FAILED_TO_FETCH_MESSAGES.len());
        assert!(table.matches(
            "TypeError: Failed to fetch dynamically imported module: https://shop.example/assets/Page-3f2a.js"
        ));
        assert!(table.matches("TypeError: error loading dynamically imported module"));
        assert!(table.matches("TypeError: Importing a module script failed."));
        assert!(!table.matches("TypeError: cannot read property 'x' of undefined"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let table = FetchFailurePatterns::default();
        assert!(table.matches("FAILED TO RESOLVE MODULE specifier './x.js'"));
    }

    #[test]
    fn test_extra_phrasings() {
        let table = FetchFailurePatterns::with_extra(["ChunkLoadError", "  ", "chunkloaderror"]);
        assert_eq!(table.len(), FAILED_TO_FETCH_MESSAGES.len() + 1);
        assert!(table.matches("ChunkLoadError: Loading chunk 7 failed."));
    }

    #[test]
    fn test_from_config() {
        let mut config = FrameworkConfig::default();
        config.assets.stale_asset_patterns = vec!["Loading CSS chunk".to_string()];
        let table = FetchFailurePatterns::from_config(&config);
        assert!(table.matches("Loading CSS chunk 12 failed"));
    }

    #[test]
    fn test_match_sees_error_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("Failed to fetch dynamically imported module"))
            .context("loading /pages/index/+Page.js")
            .unwrap_err();
        assert!(FetchFailurePatterns::default().is_fetch_error(&err));
    }

    #[test]
    fn test_classify() {
        let table = FetchFailurePatterns::default();

        let stale = table.classify(LoadError::Loader(anyhow::anyhow!(
            "Failed to fetch dynamically imported module: /assets/Page-old.js"
        )));
        assert!(is_error_fetching_static_assets(&stale));
        assert!(stale.to_string().contains("/assets/Page-old.js"));

        let other = table.classify(LoadError::Loader(anyhow::anyhow!("TypeError: x is undefined")));
        assert!(!is_error_fetching_static_assets(&other));
        assert!(matches!(other, LoadError::Loader(_)));

        let reserved = table.classify(LoadError::ReservedConfigName {
            name: "failed to resolve module".to_string(),
        });
        assert!(matches!(reserved, LoadError::ReservedConfigName { .. }));
    }
}
