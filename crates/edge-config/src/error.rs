//! Page loading errors.

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Failure while loading config values or page files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A dynamically loaded chunk could not be fetched. The browser most likely
    /// runs an outdated build; a full page reload recovers.
    #[error("failed to fetch static assets: {0:#}")]
    StaleAsset(#[source] anyhow::Error),

    /// Loader code of a config value or page file failed.
    #[error("{0:#}")]
    Loader(#[from] anyhow::Error),

    /// A serialized config value uses a name reserved for internal use.
    #[error("config name '{name}' is reserved")]
    ReservedConfigName { name: String },

    /// A serialized config value could not be decoded.
    #[error("invalid value for config '{name}': {reason}")]
    InvalidConfigValue { name: String, reason: String },

    /// A config value points at code that is not part of the build.
    #[error("config '{name}' imports '{export_name}' from '{import_path}', which is not available")]
    UnresolvedImport {
        name: String,
        import_path: String,
        export_name: String,
    },
}

impl LoadError {
    /// Whether this failure is a stale-asset fetch failure.
    pub fn is_stale_asset(&self) -> bool {
        matches!(self, Self::StaleAsset(_))
    }

    /// Re-tag a loader failure as a stale-asset fetch failure. Other variants
    /// are returned unchanged.
    pub fn into_stale_asset(self) -> Self {
        match self {
            Self::Loader(cause) => Self::StaleAsset(cause),
            other => other,
        }
    }
}
