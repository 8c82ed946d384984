//! Build-tool flag resolution.
//!
//! Turns a [`PlatformDescriptor`] for one concrete architecture into the
//! ordered token list passed to `b2`. Order matters: the build tool applies
//! properties positionally, so later tokens override earlier ones.
//!
//! Emission order:
//!
//! | # | Token | Condition |
//! |---|---|---|
//! | 1 | `--with-<lib>` | every library, declared order |
//! | 2 | `--abbreviate-paths` | always |
//! | 3 | `--stagedir=<root>/<arch>` | always |
//! | 4 | `-j<n>` | always |
//! | 5 | `toolset=` | always |
//! | 6 | `link=` | always |
//! | 7 | `runtime-link=` | Visual Studio with a runtime set |
//! | 8 | `variant=` | always |
//! | 9 | `address-model=` | always |
//! | 10 | `target-os=` | always |
//! | 11 | `architecture=` | always |

use std::path::{Path, PathBuf};

use bpk_schema::arch::{self, ArchClass};
use bpk_schema::PlatformDescriptor;

use crate::error::BuildError;
use crate::shim::ToolchainShim;

/// Ordered, immutable list of build-tool tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFlagSet(Vec<String>);

impl BuildFlagSet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Value of the first `key=value` token with the given key.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.0.iter().find_map(|token| {
            token
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
        })
    }
}

impl std::fmt::Display for BuildFlagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

impl IntoIterator for BuildFlagSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BuildFlagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Inputs to flag resolution that do not come from the platform.
#[derive(Debug, Clone, Copy)]
pub struct FlagContext<'a> {
    /// Sub-libraries to build, in declared order.
    pub libraries: &'a [String],
    /// Parent of the per-architecture stage directories.
    pub staging_root: &'a Path,
    /// Parallel jobs for the build tool.
    pub jobs: usize,
    /// Shim written for non-Visual Studio compilers.
    pub shim: Option<&'a ToolchainShim>,
}

/// Default `-j` value: one job per logical CPU.
pub fn default_jobs() -> usize {
    num_cpus::get().max(1)
}

/// Stage directory of one architecture under `staging_root`.
pub fn stage_dir(staging_root: &Path, arch: &str) -> PathBuf {
    staging_root.join(arch)
}

/// `toolset=` value.
///
/// Visual Studio maps to `msvc-<major>.0`; everything else uses the shim's
/// toolset, or the family's toolset module when no shim was written.
pub fn toolset(platform: &PlatformDescriptor, shim: Option<&ToolchainShim>) -> String {
    if platform.is_vendor_ide() {
        return format!("msvc-{}.0", platform.compiler.version);
    }
    shim.map_or_else(
        || platform.compiler.family.toolset_module().to_string(),
        |s| s.toolset.clone(),
    )
}

/// Resolve the flags for one concrete architecture.
///
/// # Errors
///
/// Returns [`BuildError::UnknownArchitecture`] if the architecture cannot be
/// classified, including the universal sentinel, which must be expanded
/// before resolution.
pub fn resolve_flags(
    platform: &PlatformDescriptor,
    ctx: &FlagContext<'_>,
) -> Result<BuildFlagSet, BuildError> {
    if arch::is_universal(&platform.arch) {
        return Err(BuildError::UnknownArchitecture(platform.arch.clone()));
    }
    // Classify first so nothing is emitted for an unknown architecture.
    let class = ArchClass::classify(&platform.arch)?;

    let mut flags: Vec<String> = ctx
        .libraries
        .iter()
        .map(|lib| format!("--with-{lib}"))
        .collect();
    flags.push("--abbreviate-paths".to_string());
    flags.push(format!(
        "--stagedir={}",
        stage_dir(ctx.staging_root, &platform.arch).display()
    ));
    flags.push(format!("-j{}", ctx.jobs.max(1)));
    flags.push(format!("toolset={}", toolset(platform, ctx.shim)));
    flags.push(format!("link={}", platform.link_mode.as_str()));

    if platform.is_vendor_ide() && platform.runtime.is_specified() {
        let runtime_link = if platform.runtime.is_static() { "static" } else { "shared" };
        flags.push(format!("runtime-link={runtime_link}"));
    }

    flags.push(format!("variant={}", platform.build_type.variant()));
    flags.push(format!("address-model={}", class.address_width));
    flags.push(format!("target-os={}", platform.os.target_os()));
    flags.push(format!("architecture={}", class.family));

    Ok(BuildFlagSet(flags))
}
