//! Build orchestration.
//!
//! Runs the one-time bootstrap of the shared source tree, then one build-tool
//! invocation per concrete architecture. A universal target fans out over the
//! recipe's ordered sub-architecture list; anything else builds once.
//!
//! ## Invocation contract
//!
//! | Step | Program | Working dir | Environment |
//! |---|---|---|---|
//! | bootstrap | `/bin/sh bootstrap.sh` (`cmd /C bootstrap.bat` on Windows) | source tree | inherited, minus `CC`, `CXX`, `CFLAGS`, `CXXFLAGS`, `CPPFLAGS`, `LDFLAGS` |
//! | build | `./b2 <flags>` | source tree | inherited, plus `BOOST_BUILD_USER_CONFIG` when a shim was written |
//!
//! The bootstrap compiles the build tool itself with the host compiler, so
//! the caller's cross-compilation settings are scrubbed from its environment
//! only. Each architecture stages into `<staging root>/<arch>`, which keeps
//! sub-builds from colliding.
//!
//! Any nonzero exit aborts the whole run. Stage directories already written
//! are left in place for inspection; they are not a usable result.

use std::path::{Path, PathBuf};

use bpk_schema::arch::{self, ArchClass};
use bpk_schema::PlatformDescriptor;

use crate::error::{BuildError, BuildStage};
use crate::flags::{self, FlagContext};
use crate::paths;
use crate::runner::{CommandRunner, Invocation};
use crate::shim::{self, ToolchainEnv, ToolchainShim};

/// Compiler variables removed from the bootstrap's environment.
pub const BOOTSTRAP_SCRUBBED_ENV: [&str; 6] =
    ["CC", "CXX", "CFLAGS", "CXXFLAGS", "CPPFLAGS", "LDFLAGS"];

/// Whether a build fans out over sub-architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// One concrete architecture.
    Idle,
    /// Universal target: one build per sub-architecture.
    Fanning,
}

impl FanOut {
    pub fn for_platform(platform: &PlatformDescriptor) -> Self {
        if platform.is_universal() {
            Self::Fanning
        } else {
            Self::Idle
        }
    }
}

/// The concrete architectures to build, in order.
///
/// Every entry is classified up front so that an unknown architecture fails
/// before anything runs.
///
/// # Errors
///
/// Returns [`BuildError::UnknownArchitecture`] for an unclassifiable
/// architecture (including a nested `universal`), or a context error when a
/// universal target has an empty fan-out list.
pub fn sub_architectures(
    platform: &PlatformDescriptor,
    universal_archs: &[String],
) -> Result<Vec<String>, BuildError> {
    let archs = match FanOut::for_platform(platform) {
        FanOut::Idle => vec![platform.arch.clone()],
        FanOut::Fanning => {
            if universal_archs.is_empty() {
                return Err(BuildError::context(
                    "Universal build",
                    "no sub-architectures configured",
                ));
            }
            universal_archs.iter().map(|a| arch::normalize(a)).collect()
        }
    };

    for raw in &archs {
        if arch::is_universal(raw) {
            return Err(BuildError::UnknownArchitecture(raw.clone()));
        }
        ArchClass::classify(raw)?;
    }
    Ok(archs)
}

/// Everything one build needs.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub platform: &'a PlatformDescriptor,
    /// Sub-libraries, declared order.
    pub libraries: &'a [String],
    /// Fan-out list used when the platform is universal.
    pub universal_archs: &'a [String],
    /// Extracted source tree (shared by all sub-builds).
    pub source_dir: &'a Path,
    /// Scratch directory for shims and staging.
    pub work_dir: &'a Path,
    pub jobs: usize,
    pub toolchain: &'a ToolchainEnv,
}

/// Where one architecture's outputs were staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArch {
    pub arch: String,
    pub stage_dir: PathBuf,
}

/// Result of a fully successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub universal: bool,
    pub staging_root: PathBuf,
    /// One entry per architecture, in build order.
    pub stages: Vec<StagedArch>,
}

/// Runs bootstrap and build-tool invocations through a [`CommandRunner`].
#[derive(Debug)]
pub struct Builder<R> {
    runner: R,
}

impl<R: CommandRunner> Builder<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Path of the build-tool binary produced by the bootstrap.
    pub fn b2_path(source_dir: &Path) -> PathBuf {
        source_dir.join(if cfg!(windows) { "b2.exe" } else { "b2" })
    }

    /// Bootstrap the source tree, unless it already has a build tool.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ExternalBuildFailure`] with
    /// [`BuildStage::Bootstrap`] on a nonzero exit.
    pub fn bootstrap(&self, source_dir: &Path) -> Result<(), BuildError> {
        if Self::b2_path(source_dir).is_file() {
            tracing::info!("build tool already bootstrapped, skipping");
            return Ok(());
        }

        let mut invocation = if cfg!(windows) {
            Invocation::new("cmd", source_dir).args(["/C", "bootstrap.bat"])
        } else {
            Invocation::new("/bin/sh", source_dir).arg("bootstrap.sh")
        };
        for key in BOOTSTRAP_SCRUBBED_ENV {
            invocation = invocation.env_remove(key);
        }

        tracing::info!(source = %source_dir.display(), "bootstrapping");
        let status = self.runner.run(&invocation)?;
        if !status.success {
            return Err(BuildError::ExternalBuildFailure {
                stage: BuildStage::Bootstrap,
                code: status.code,
            });
        }
        Ok(())
    }

    /// Bootstrap once, then build every architecture in order.
    ///
    /// One toolchain shim serves all slices, so sibling architectures of the
    /// same family (`armv7` and `armv7s`) get flag sets that differ only in
    /// `--stagedir`. Per-slice compiler flags such as `-arch <slice>` are the
    /// caller's responsibility, through `CXXFLAGS` or a `CXX` wrapper.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown architecture (before running anything), on
    /// a shim write error, or on the first failing external step. Later
    /// architectures are not attempted after a failure.
    pub fn build(&self, req: &BuildRequest<'_>) -> Result<BuildOutcome, BuildError> {
        let fan_out = FanOut::for_platform(req.platform);
        let archs = sub_architectures(req.platform, req.universal_archs)?;
        let universal = fan_out == FanOut::Fanning;
        let staging_root = paths::staging_root(req.work_dir, universal);

        tracing::info!(
            platform = %req.platform,
            state = ?fan_out,
            archs = %archs.join(", "),
            "starting build"
        );

        let shim = if req.platform.is_vendor_ide() {
            None
        } else {
            Some(shim::write_shim(
                req.work_dir,
                &req.platform.compiler,
                req.toolchain,
            )?)
        };

        self.bootstrap(req.source_dir)?;

        let mut stages = Vec::with_capacity(archs.len());
        for arch in &archs {
            let stage_dir = self.build_arch(req, arch, &staging_root, shim.as_ref())?;
            stages.push(StagedArch {
                arch: arch.clone(),
                stage_dir,
            });
        }

        Ok(BuildOutcome {
            universal,
            staging_root,
            stages,
        })
    }

    fn build_arch(
        &self,
        req: &BuildRequest<'_>,
        arch: &str,
        staging_root: &Path,
        shim: Option<&ToolchainShim>,
    ) -> Result<PathBuf, BuildError> {
        let _span = tracing::info_span!("build", arch).entered();

        let platform = req.platform.with_arch(arch);
        let ctx = FlagContext {
            libraries: req.libraries,
            staging_root,
            jobs: req.jobs,
            shim,
        };
        let flag_set = flags::resolve_flags(&platform, &ctx)?;
        tracing::info!(flags = %flag_set, "invoking build tool");

        let mut invocation =
            Invocation::new(Self::b2_path(req.source_dir), req.source_dir).args(flag_set);
        if let Some(shim) = shim {
            invocation = invocation.env(
                shim::USER_CONFIG_ENV,
                shim.user_config.display().to_string(),
            );
        }

        let status = self.runner.run(&invocation)?;
        if !status.success {
            return Err(BuildError::ExternalBuildFailure {
                stage: BuildStage::Build {
                    arch: arch.to_string(),
                },
                code: status.code,
            });
        }
        Ok(flags::stage_dir(staging_root, arch))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;
    use crate::runner::RunStatus;

    /// Records invocations; fails any build whose stage dir ends in
    /// `fail_arch`, and can simulate outputs.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub(crate) calls: RefCell<Vec<Invocation>>,
        pub(crate) fail_arch: Option<String>,
        pub(crate) fail_bootstrap: bool,
        /// Files to create under `<stagedir>/lib` on each successful build.
        pub(crate) outputs: Vec<String>,
    }

    impl RecordingRunner {
        pub(crate) fn stagedir(inv: &Invocation) -> Option<PathBuf> {
            inv.args
                .iter()
                .find_map(|a| a.strip_prefix("--stagedir="))
                .map(PathBuf::from)
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<RunStatus, BuildError> {
            self.calls.borrow_mut().push(invocation.clone());

            let Some(stagedir) = Self::stagedir(invocation) else {
                let code = if self.fail_bootstrap { 1 } else { 0 };
                return Ok(RunStatus::from_code(code));
            };

            if let Some(fail) = &self.fail_arch {
                if stagedir.ends_with(fail) {
                    std::fs::create_dir_all(stagedir.join("lib"))?;
                    return Ok(RunStatus::from_code(2));
                }
            }

            let lib = stagedir.join("lib");
            std::fs::create_dir_all(&lib)?;
            for name in &self.outputs {
                std::fs::write(lib.join(name), b"")?;
            }
            Ok(RunStatus::from_code(0))
        }
    }
}
