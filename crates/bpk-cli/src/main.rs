//! bpk - build and package Boost

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bpk_cli::cmd;
use bpk_cli::cmd::build::BuildOptions;
use bpk_cli::{Cli, Commands, Context};
use bpk_core::flags::default_jobs;
use bpk_core::paths::work_path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let recipe = cli.recipe.as_deref();

    match cli.command {
        Commands::Flags {
            platform,
            jobs,
            work_dir,
        } => {
            let ctx = Context::load(recipe, &platform)?;
            let work_dir = work_dir.unwrap_or_else(|| work_path(&ctx.recipe));
            cmd::flags::flags(&ctx, &work_dir, jobs.unwrap_or_else(default_jobs))
        }
        Commands::Names { platform } => cmd::names::names(&Context::load(recipe, &platform)?),
        Commands::Info { platform } => cmd::info::info(&Context::load(recipe, &platform)?),
        Commands::Build {
            platform,
            toolchain,
            jobs,
            work_dir,
            output,
        } => {
            let ctx = Context::load(recipe, &platform)?;
            let opts = BuildOptions {
                work_dir,
                output,
                jobs: jobs.unwrap_or_else(default_jobs),
                toolchain: (&toolchain).into(),
                verbose: cli.verbose,
            };
            cmd::build::build(&ctx, opts).await
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
