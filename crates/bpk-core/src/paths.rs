use dirs::home_dir;
use std::path::{Path, PathBuf};

use bpk_schema::{PlatformDescriptor, Recipe};

/// Staging root of a single-architecture build, relative to the work dir.
pub const BUILD_DIR: &str = "build";

/// Staging root of a universal build, relative to the work dir. Each
/// sub-architecture stages into its own child directory.
pub const UNIVERSAL_BUILD_DIR: &str = "build-universal";

/// Returns the primary data directory, or None if the user's home cannot be resolved.
pub fn try_bpk_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("BPK_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".bpk"))
}

/// Returns the bpk home directory (`~/.bpk`), falling back to `.bpk` in the
/// current directory when no home can be resolved.
pub fn bpk_home() -> PathBuf {
    try_bpk_home().unwrap_or_else(|| PathBuf::from(".bpk"))
}

/// Work trees: ~/.bpk/work/<name>-<version>
pub fn work_path(recipe: &Recipe) -> PathBuf {
    bpk_home()
        .join("work")
        .join(format!("{}-{}", recipe.name, recipe.version))
}

/// Package cache: ~/.bpk/packages/<name>/<version>/<platform>
pub fn package_path(recipe: &Recipe, platform: &PlatformDescriptor) -> PathBuf {
    bpk_home()
        .join("packages")
        .join(&recipe.name)
        .join(recipe.version.to_string())
        .join(platform_slug(platform))
}

/// Logs directory: ~/.bpk/logs
pub fn log_dir() -> PathBuf {
    bpk_home().join("logs")
}

/// Generate a build log path for a package
pub fn build_log_path(package: &str, version: &str) -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    log_dir().join(format!("build-{package}-{version}-{timestamp}.log"))
}

/// Staging root under `work_dir` for the given target.
pub fn staging_root(work_dir: &Path, universal: bool) -> PathBuf {
    work_dir.join(if universal {
        UNIVERSAL_BUILD_DIR
    } else {
        BUILD_DIR
    })
}

/// Filesystem-safe identifier of a platform, e.g.
/// `windows-visual-studio14-x86_64-release-static-mt`.
pub fn platform_slug(platform: &PlatformDescriptor) -> String {
    let mut slug = format!(
        "{}-{}{}-{}-{}-{}",
        platform.os,
        platform.compiler.family.as_str().replace(' ', "-"),
        platform.compiler.version,
        platform.arch,
        platform.build_type,
        platform.link_mode
    );
    if let Some(code) = platform.runtime.code() {
        slug.push('-');
        slug.push_str(code);
    }
    slug.to_lowercase()
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpk_schema::{BuildType, Compiler, CompilerFamily, LinkMode, Os, RuntimeMode};

    #[test]
    fn test_staging_root_uses_single_universal_name() {
        let work = Path::new("/w");
        assert_eq!(staging_root(work, false), Path::new("/w/build"));
        assert_eq!(staging_root(work, true), Path::new("/w/build-universal"));
    }

    #[test]
    fn test_platform_slug() {
        let desc = PlatformDescriptor::new(
            Os::Windows,
            Compiler::new(CompilerFamily::VisualStudio, 14),
            RuntimeMode::StaticRelease,
            "x86_64",
            BuildType::Release,
            LinkMode::Static,
        );
        assert_eq!(
            platform_slug(&desc),
            "windows-visual-studio14-x86_64-release-static-mt"
        );
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://example.com/release/boost_1_64_0.tar.gz"),
            "boost_1_64_0.tar.gz"
        );
        assert_eq!(filename_from_url(""), "");
    }
}
