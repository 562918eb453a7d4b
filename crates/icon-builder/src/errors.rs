use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(config::not_found),
        help("Pass an existing toml file to --config, or leave the flag out to use the built-in defaults")
    )]
    ConfigNotFound { path: Utf8PathBuf },

    #[error("Configuration file error in {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check the [cdn] and [rules] tables for syntax errors and unknown keys")
    )]
    ConfigParse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(config::invalid))]
    InvalidConfig { reason: String },

    #[error("No catalog given")]
    #[diagnostic(
        code(catalog::missing),
        help("Pass the exported catalog JSON with --catalog <FILE>")
    )]
    CatalogMissing,

    #[error("Failed to read catalog {path}")]
    #[diagnostic(code(catalog::read_failed), help("Make sure the file exists and is readable"))]
    CatalogRead {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog {path} is not valid")]
    #[diagnostic(
        code(catalog::parse_error),
        help("The catalog must contain types, groupCategories, iconFiles, graphicsFolders and skinMaterials tables")
    )]
    CatalogParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Resource CDN is unavailable")]
    #[diagnostic(
        code(cache::unavailable),
        help("The client descriptor could not be fetched or the server is in maintenance. Try again later")
    )]
    CacheUnavailable {
        #[source]
        source: icon_cache::Error,
    },

    #[error("Cache folder looks like a game installation: {path}")]
    #[diagnostic(
        code(cache::invalid_dir),
        help("Point --cache-folder at a dedicated directory, never at the game client itself")
    )]
    InvalidCacheDir { path: Utf8PathBuf },

    #[error("Resource cache error")]
    #[diagnostic(code(cache::failed))]
    Cache {
        #[source]
        source: icon_cache::Error,
    },

    #[error("Icon build failed")]
    #[diagnostic(
        code(build::failed),
        help("Corrupt source art usually means a damaged cache. Purge the cache folder and run again")
    )]
    Build {
        #[from]
        source: icon_export::Error,
    },

    #[error("Cannot open log file {path}")]
    #[diagnostic(code(log::open_failed), help("Check file permissions and available disk space"))]
    LogFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    /// Sort a cache error into the diagnostic that explains it best.
    pub fn from_cache(source: icon_cache::Error) -> Self {
        match source {
            icon_cache::Error::InvalidCacheDir(path) => Self::InvalidCacheDir { path },
            icon_cache::Error::ProtectedState
            | icon_cache::Error::Http(_)
            | icon_cache::Error::Unavailable { .. } => Self::CacheUnavailable { source },
            source => Self::Cache { source },
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
