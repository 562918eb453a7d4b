mod build;
mod purge;

pub use build::run_build;
pub use purge::{purge_cache, PurgeCacheArgs};

use crate::errors::CliError;
use crate::utils::config::AppConfig;
use camino::Utf8PathBuf;
use icon_cache::CacheDownloader;
use icon_export::BuildOptions;

/// Settings shared by every subcommand.
#[derive(Debug)]
pub struct CommandContext {
    pub user_agent: String,
    pub cache_folder: Utf8PathBuf,
    pub icon_folder: Utf8PathBuf,
    pub catalog: Option<Utf8PathBuf>,
    pub config: AppConfig,
    pub options: BuildOptions,
    pub skip_if_fresh: bool,
    pub silent: bool,
}

impl CommandContext {
    pub fn open_cache(&self) -> Result<CacheDownloader, CliError> {
        CacheDownloader::new(
            self.cache_folder.clone(),
            &self.user_agent,
            self.config.cdn.clone(),
        )
        .map_err(CliError::from_cache)
    }
}
