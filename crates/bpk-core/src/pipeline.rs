//! Build-then-package for one recipe on one platform.

use std::path::{Path, PathBuf};

use bpk_schema::{PlatformDescriptor, Recipe};

use crate::builder::{BuildOutcome, BuildRequest, Builder};
use crate::error::BuildError;
use crate::metadata::{LinkMetadata, link_metadata};
use crate::runner::CommandRunner;
use crate::shim::ToolchainEnv;
use crate::staging::{StagedPackage, stage_package, verify_outputs};

/// Inputs of a packaging run. The source tree must already be fetched.
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    pub recipe: &'a Recipe,
    pub platform: &'a PlatformDescriptor,
    pub source_dir: &'a Path,
    pub work_dir: &'a Path,
    pub package_dir: &'a Path,
    pub jobs: usize,
    pub toolchain: &'a ToolchainEnv,
}

#[derive(Debug, Clone)]
pub struct PackageOutcome {
    pub build: BuildOutcome,
    pub staged: StagedPackage,
    pub metadata: LinkMetadata,
    pub metadata_path: PathBuf,
}

/// Bootstrap, build every architecture, stage, and write link metadata.
///
/// Packaging only starts after every sub-build succeeded and produced every
/// expected library file.
pub fn build_package<R: CommandRunner>(
    builder: &Builder<R>,
    req: &PackageRequest<'_>,
) -> Result<PackageOutcome, BuildError> {
    req.platform.validate()?;

    let build = builder.build(&BuildRequest {
        platform: req.platform,
        libraries: &req.recipe.libraries,
        universal_archs: &req.recipe.universal_archs,
        source_dir: req.source_dir,
        work_dir: req.work_dir,
        jobs: req.jobs,
        toolchain: req.toolchain,
    })?;

    let version = req.recipe.version.to_string();
    verify_outputs(&build, req.platform, &req.recipe.libraries, &version)?;

    let staged = stage_package(
        &build,
        req.platform.link_mode,
        req.source_dir,
        req.package_dir,
    )?;

    let metadata = link_metadata(req.platform, &req.recipe.libraries, &version);
    let metadata_path = metadata.write(req.package_dir)?;
    tracing::info!(path = %metadata_path.display(), "wrote package metadata");

    Ok(PackageOutcome {
        build,
        staged,
        metadata,
        metadata_path,
    })
}
