//! Recipe and target resolution shared by the subcommands.

use std::path::Path;

use anyhow::{Context as _, Result};
use bpk_core::shim::ToolchainEnv;
use bpk_schema::{Compiler, CompilerFamily, LinkMode, Os, PlatformDescriptor, Recipe};

use crate::{PlatformArgs, ToolchainArgs};

/// The recipe and fully resolved target of one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub recipe: Recipe,
    pub platform: PlatformDescriptor,
}

impl Context {
    /// Load the recipe (or the built-in one) and resolve the target.
    pub fn load(recipe_path: Option<&Path>, args: &PlatformArgs) -> Result<Self> {
        let recipe = match recipe_path {
            Some(path) => Recipe::load(path)
                .with_context(|| format!("Failed to load recipe {}", path.display()))?,
            None => Recipe::default(),
        };
        let platform = resolve_platform(&recipe, args);
        platform
            .validate()
            .with_context(|| format!("Invalid target {platform}"))?;
        tracing::debug!(recipe = %recipe.name, platform = %platform, "resolved target");
        Ok(Self { recipe, platform })
    }

    /// Version string used for artifact names.
    pub fn version(&self) -> String {
        self.recipe.version.to_string()
    }
}

/// Merge CLI flags over the recipe's pinned platform over host defaults.
pub fn resolve_platform(recipe: &Recipe, args: &PlatformArgs) -> PlatformDescriptor {
    let pinned = recipe.platform.as_ref();

    let os = args
        .os
        .or_else(|| pinned.map(|p| p.os))
        .unwrap_or_else(Os::host);

    let family = args
        .compiler
        .or_else(|| pinned.map(|p| p.compiler.family))
        .unwrap_or_else(CompilerFamily::host_default);
    let version = args
        .compiler_version
        .or_else(|| {
            pinned
                .filter(|p| p.compiler.family == family)
                .map(|p| p.compiler.version)
        })
        .unwrap_or_else(|| family.default_version());

    let runtime = args
        .runtime
        .or_else(|| pinned.map(|p| p.runtime))
        .unwrap_or_default();
    let build_type = args
        .build_type
        .or_else(|| pinned.map(|p| p.build_type))
        .unwrap_or_default();
    let arch = args
        .arch
        .clone()
        .or_else(|| pinned.map(|p| p.arch.clone()))
        .unwrap_or_else(|| std::env::consts::ARCH.to_string());

    let link_mode = args
        .link_mode()
        .unwrap_or_else(|| pinned.map_or_else(|| recipe.link_mode(), |p| p.link_mode));

    PlatformDescriptor::new(
        os,
        Compiler::new(family, version),
        runtime,
        &arch,
        build_type,
        link_mode,
    )
}

impl From<&ToolchainArgs> for ToolchainEnv {
    fn from(args: &ToolchainArgs) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            cxx: non_empty(&args.cxx),
            cxxflags: non_empty(&args.cxxflags),
            ldflags: non_empty(&args.ldflags),
        }
    }
}
