use super::CommandContext;
use colored::Colorize;
use miette::Result;
use std::collections::HashSet;

#[derive(Debug)]
pub struct PurgeCacheArgs {
    /// Relative paths to keep even though no manifest lists them.
    pub keep: Vec<String>,
}

/// Delete cached files the current manifests no longer reference.
pub fn purge_cache(ctx: &CommandContext, args: PurgeCacheArgs) -> Result<()> {
    let cache = ctx.open_cache()?;
    let keep: HashSet<String> = args
        .keep
        .into_iter()
        .map(|path| path.replace('\\', "/"))
        .collect();

    let removed = cache
        .purge(&keep)
        .map_err(crate::errors::CliError::from_cache)?;

    if !ctx.silent {
        println!(
            "{} {} stale files from {}",
            "🧹 Removed".bright_blue().bold(),
            removed.to_string().bright_cyan(),
            cache.cache_dir()
        );
    }
    Ok(())
}
