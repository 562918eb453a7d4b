use crate::engine::{BuildReport, IconBuildEngine};
use crate::error::Result;
use crate::output::{OutputMode, OutputPackager};
use std::time::Instant;

/// Build icons, write the selected output and remove derived files that are no
/// longer produced.
///
/// With `skip_if_fresh`, packaging is skipped when the build index did not change.
/// The new index is saved and stale files deleted only once the output is written
/// or skipped, so a failed output is retried on the next run.
pub fn build_icon_export(
    engine: &IconBuildEngine<'_>,
    mode: &OutputMode,
    skip_if_fresh: bool,
) -> Result<BuildReport> {
    let outcome = engine.build()?;
    let mut report = outcome.report.clone();
    let delta = outcome.index.delta();

    let package_start = Instant::now();
    if skip_if_fresh && delta.is_empty() {
        tracing::info!("Icons unchanged, skipping output");
        report.output_skipped = true;
    } else {
        tracing::info!("Icons built, writing output...");
        report.checksum = OutputPackager::new(engine, &outcome).package(mode)?;
    }
    report.timings.package = package_start.elapsed();

    outcome.index.save(&engine.index_path())?;

    for filename in &delta.to_remove {
        let path = engine.icon_dir().join(filename);
        match std::fs::remove_file(path.as_std_path()) {
            Ok(()) => tracing::debug!("Removed stale {}", filename),
            Err(e) => tracing::debug!("Could not remove stale {}: {}", filename, e),
        }
    }

    Ok(report)
}
