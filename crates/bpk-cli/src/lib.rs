//! bpk - build and package Boost for a target platform
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Resolves a target description (OS, compiler, runtime, architecture,
//! build type, link mode) into build-tool flags, artifact names and consumer
//! link metadata, and drives the full fetch, bootstrap, build and staging
//! pipeline.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.bpk/
//! ├── work/       # Extracted sources and staging trees per recipe
//! ├── packages/   # Staged packages by name/version/platform
//! └── logs/       # Build-tool output, one file per build
//! ```

pub mod cmd;
pub mod context;

pub use context::Context;

use std::path::PathBuf;

use bpk_schema::{BuildType, CompilerFamily, LinkMode, Os, RuntimeMode};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bpk")]
#[command(author, version = env!("BPK_VERSION"), about = "bpk - build and package Boost")]
pub struct Cli {
    /// Recipe file (defaults to the built-in Boost 1.64.0 recipe)
    #[arg(long, global = true, env = "BPK_RECIPE")]
    pub recipe: Option<PathBuf>,

    /// Show build-tool output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target selection shared by every resolving subcommand.
///
/// Anything left unset falls back to the recipe's `[platform]` table, then to
/// the host defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct PlatformArgs {
    /// Target operating system (Windows, Macos, Linux, iOS, Android, FreeBSD)
    #[arg(long)]
    pub os: Option<Os>,

    /// Compiler family (gcc, clang, apple-clang, msvc)
    #[arg(long)]
    pub compiler: Option<CompilerFamily>,

    /// Compiler major version (14 for Visual Studio 2015)
    #[arg(long)]
    pub compiler_version: Option<u32>,

    /// Visual Studio runtime (MT, MTd, MD, MDd)
    #[arg(long)]
    pub runtime: Option<RuntimeMode>,

    /// Target architecture, or `universal` for a fat build
    #[arg(long)]
    pub arch: Option<String>,

    /// Debug or Release
    #[arg(long)]
    pub build_type: Option<BuildType>,

    /// Build shared libraries
    #[arg(long, overrides_with = "static_link")]
    pub shared: bool,

    /// Build static libraries, overriding the recipe
    #[arg(long = "static", overrides_with = "shared")]
    pub static_link: bool,
}

impl PlatformArgs {
    /// Link mode picked on the command line, if any.
    pub fn link_mode(&self) -> Option<LinkMode> {
        if self.shared {
            Some(LinkMode::Shared)
        } else if self.static_link {
            Some(LinkMode::Static)
        } else {
            None
        }
    }
}

/// Compiler selection read from the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ToolchainArgs {
    /// C++ compiler driver
    #[arg(long, env = "CXX", hide_env_values = true)]
    pub cxx: Option<String>,

    /// Extra compile flags
    #[arg(long, env = "CXXFLAGS", hide_env_values = true, allow_hyphen_values = true)]
    pub cxxflags: Option<String>,

    /// Extra link flags
    #[arg(long, env = "LDFLAGS", hide_env_values = true, allow_hyphen_values = true)]
    pub ldflags: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the build-tool flags for each architecture
    Flags {
        #[command(flatten)]
        platform: PlatformArgs,
        /// Parallel jobs (defaults to the CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Working directory (defaults to ~/.bpk/work/<name>-<version>)
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
    /// Print the expected artifact file names
    Names {
        #[command(flatten)]
        platform: PlatformArgs,
    },
    /// Print consumer link metadata as JSON
    Info {
        #[command(flatten)]
        platform: PlatformArgs,
    },
    /// Fetch, bootstrap, build and stage a package
    Build {
        #[command(flatten)]
        platform: PlatformArgs,
        #[command(flatten)]
        toolchain: ToolchainArgs,
        /// Parallel jobs (defaults to the CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Working directory (defaults to ~/.bpk/work/<name>-<version>)
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Package output directory (defaults to ~/.bpk/packages/...)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
