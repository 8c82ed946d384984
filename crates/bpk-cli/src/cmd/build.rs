//! Build command

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context as _, Result};
use bpk_core::io::fetch_source;
use bpk_core::paths::{build_log_path, log_dir, package_path, work_path};
use bpk_core::pipeline::{PackageRequest, build_package};
use bpk_core::shim::ToolchainEnv;
use bpk_core::{BuildError, Builder, ProcessRunner};
use crossterm::style::Stylize;

use crate::Context;

/// Where and how to build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub work_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub jobs: usize,
    pub toolchain: ToolchainEnv,
    /// Stream build-tool output instead of logging it to a file.
    pub verbose: bool,
}

/// Fetch the sources, then bootstrap, build, stage and describe the package.
pub async fn build(ctx: &Context, opts: BuildOptions) -> Result<()> {
    let start = Instant::now();
    let recipe = &ctx.recipe;
    let work_dir = opts.work_dir.unwrap_or_else(|| work_path(recipe));
    let package_dir = opts
        .output
        .unwrap_or_else(|| package_path(recipe, &ctx.platform));

    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("Failed to create work dir {}", work_dir.display()))?;

    println!();
    println!(
        "  {} {}",
        recipe.name.as_str().white().bold(),
        recipe.version.to_string().dark_grey()
    );
    println!("  {:<12}{}", "target", ctx.platform);
    println!("  {:<12}{}", "work dir", work_dir.display());
    println!();

    let client = reqwest::Client::new();
    let source_dir = fetch_source(&client, recipe, &work_dir)
        .await
        .context("Failed to fetch sources")?;

    let runner = if opts.verbose {
        ProcessRunner::new()
    } else {
        std::fs::create_dir_all(log_dir()).context("Failed to create log dir")?;
        ProcessRunner::with_log(build_log_path(&recipe.name, &ctx.version()))
    };
    if let Some(log) = runner.log_path() {
        println!("  {:<12}{}", "log", log.display().to_string().dark_grey());
    }

    let builder = Builder::new(runner);
    let result = build_package(
        &builder,
        &PackageRequest {
            recipe,
            platform: &ctx.platform,
            source_dir: &source_dir,
            work_dir: &work_dir,
            package_dir: &package_dir,
            jobs: opts.jobs,
            toolchain: &opts.toolchain,
        },
    );

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(stage) = err.stage() {
                println!("  {} {}", "✗".red(), format!("{stage} failed").red());
            }
            if matches!(err, BuildError::ExternalBuildFailure { .. }) {
                println!(
                    "  {}",
                    format!("work tree left at {}", work_dir.display()).dark_grey()
                );
            }
            return Err(err.into());
        }
    };

    for stage in &outcome.build.stages {
        println!("  {} {}", "✓".green(), stage.arch);
    }
    println!();
    println!("  {:<12}{}", "package", outcome.staged.root.display());
    println!(
        "  {:<12}{} libraries, {} headers",
        "contents",
        outcome.staged.libraries.len(),
        outcome.staged.headers
    );
    println!("  {:<12}{}", "metadata", outcome.metadata_path.display());
    println!();
    println!(
        "{}",
        format!("Built in {:.1}s", start.elapsed().as_secs_f64()).dark_grey()
    );
    Ok(())
}
