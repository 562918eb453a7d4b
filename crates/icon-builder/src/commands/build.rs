use super::CommandContext;
use crate::errors::CliError;
use crate::utils::catalog::load_catalog;
use colored::Colorize;
use icon_cache::SharedCache;
use icon_export::{build_icon_export, BuildReport, BuildRules, IconBuildEngine, OutputMode};
use miette::Result;
use std::time::{Duration, Instant};

pub fn run_build(ctx: &CommandContext, mode: OutputMode) -> Result<()> {
    let started = Instant::now();

    let catalog_path = ctx.catalog.as_deref().ok_or(CliError::CatalogMissing)?;
    let data = load_catalog(catalog_path)?;
    let rules = ctx.config.rules.apply(BuildRules::default())?;

    let cache = ctx.open_cache()?;
    let cache_ready = started.elapsed();

    let engine = IconBuildEngine::new(&data, &cache, ctx.icon_folder.clone())
        .with_rules(rules)
        .with_options(ctx.options.clone());

    let report = build_icon_export(&engine, &mode, ctx.skip_if_fresh).map_err(CliError::from)?;

    match (&mode, &report.checksum) {
        (OutputMode::Checksum { out: None }, Some(checksum)) => print!("{checksum}"),
        _ if !ctx.silent => print_summary(cache.version(), &mode, &report, cache_ready),
        _ => {}
    }

    Ok(())
}

fn print_summary(version: &str, mode: &OutputMode, report: &BuildReport, cache_ready: Duration) {
    println!(
        "{} {}",
        "🖼  Icons built for client build".bright_blue().bold(),
        version.bright_cyan().bold()
    );
    println!(
        "   {} items, {} composited, {} reused, {} failed",
        report.considered.to_string().bright_white(),
        report.composited.to_string().bright_green(),
        report.reused,
        report.failed.to_string().bright_red()
    );
    println!(
        "   {} added, {} removed since the last build",
        format!("+{}", report.to_add).bright_green(),
        format!("-{}", report.to_remove).bright_red()
    );

    if !report.skipped.is_empty() {
        let examples: Vec<String> = report
            .skipped_examples()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "   {} {} items without icon (e.g. {})",
            "⚠".yellow(),
            report.skipped.len().to_string().yellow(),
            examples.join(", ")
        );
    }

    if report.output_skipped {
        println!("   {}", "Nothing changed, output not rewritten".dimmed());
    } else if let Some(checksum) = &report.checksum {
        println!("   checksum {}", checksum.bright_cyan());
    } else {
        println!("   {} output written", mode.name().bright_cyan());
    }

    let timings = &report.timings;
    println!(
        "   {}",
        format!(
            "cache {:.2?}, classify {:.2?}, composite {:.2?}, package {:.2?}",
            cache_ready, timings.classify, timings.composite, timings.package
        )
        .dimmed()
    );
}
