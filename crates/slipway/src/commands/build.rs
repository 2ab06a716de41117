use colored::Colorize;
use slipway_build::{RunConfig, scheduler};
use slipway_core::Manifest;
use std::path::Path;

/// Handle `slipway build`: load the manifest, run the scheduler and
/// return the aggregated exit code.
pub async fn handle(
    manifest_path: &Path,
    parallel: Option<usize>,
    container: Option<String>,
    push: bool,
    silent: bool,
) -> anyhow::Result<i32> {
    let manifest = Manifest::load(manifest_path)?;

    if container.is_some() && parallel.is_some() {
        println!(
            "{}",
            "Both '--container' and '--parallel' were specified, ignoring '--parallel'".yellow()
        );
    }

    // Fail up front on a typo'd name rather than silently building
    // nothing.
    if let Some(name) = &container {
        manifest.require(name)?;
    }

    println!(
        "{}",
        format!("Building {} container(s)...", selected_count(&manifest, &container)).green()
    );

    let config = RunConfig::new(push, silent, parallel, container);
    let code = scheduler::run(&manifest.units, &config).await;

    if code == 0 {
        println!("{}", "Done".green());
    } else {
        println!("{}", format!("Build run failed (exit code {})", code).red());
    }

    Ok(code)
}

fn selected_count(manifest: &Manifest, container: &Option<String>) -> usize {
    match container {
        Some(_) => 1,
        None => manifest.units.len(),
    }
}
