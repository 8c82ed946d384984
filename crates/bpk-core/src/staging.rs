//! Copy build outputs into the package layout.
//!
//! ```text
//! <package>/
//!   include/boost/...      headers from <source>/boost, relative paths kept
//!   lib/                   static libs (and .so/.dylib when shared)
//!   lib/<arch>/            same, per sub-architecture, for universal builds
//!   bin/                   .dll files when shared
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bpk_schema::{LinkMode, PlatformDescriptor};
use glob::Pattern;
use walkdir::WalkDir;

use crate::builder::BuildOutcome;
use crate::error::BuildError;
use crate::naming::expected_files;

const STATIC_LIB_PATTERNS: &[&str] = &["*.lib", "*.a"];
const SHARED_LIB_PATTERNS: &[&str] = &["*.so", "*.so.*", "*.dylib"];
const SHARED_BIN_PATTERNS: &[&str] = &["*.dll"];
const HEADER_PATTERNS: &[&str] = &["*.hpp", "*.h", "*.ipp"];

/// Header root inside the source tree and the package.
const HEADER_DIR: &str = "boost";

/// What ended up in the package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedPackage {
    pub root: PathBuf,
    /// Library files, relative to `root`.
    pub libraries: Vec<PathBuf>,
    /// Runtime binaries, relative to `root`.
    pub binaries: Vec<PathBuf>,
    pub headers: usize,
}

fn compile(patterns: &[&str]) -> Result<Vec<Pattern>, BuildError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| BuildError::context("Invalid glob pattern", e)))
        .collect()
}

fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| patterns.iter().any(|p| p.matches(name)))
}

/// Files (or links to files) under `dir` whose name matches any pattern,
/// sorted for stable output.
fn collect(dir: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() || e.path_is_symlink())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| matches_any(patterns, p))
        .collect();
    found.sort();
    found
}

/// Copy `files` flat into `dest_dir`, returning destinations relative to `root`.
fn copy_flat(files: &[PathBuf], dest_dir: &Path, root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(dest_dir)?;
    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let dest = dest_dir.join(name);
        fs::copy(file, &dest)?;
        if let Ok(rel) = dest.strip_prefix(root) {
            copied.push(rel.to_path_buf());
        }
    }
    Ok(copied)
}

/// Check that every stage holds every file each library should produce.
///
/// The build tool can exit cleanly after silently skipping a library, so
/// the outputs are matched against [`expected_files`] before anything is
/// staged.
///
/// # Errors
///
/// Returns [`BuildError::MissingArtifact`] naming the first missing file and
/// the architecture it was expected for.
pub fn verify_outputs(
    build: &BuildOutcome,
    platform: &PlatformDescriptor,
    libraries: &[String],
    version: &str,
) -> Result<(), BuildError> {
    for stage in &build.stages {
        let lib_dir = stage.stage_dir.join("lib");
        let slice = platform.with_arch(&stage.arch);
        for library in libraries {
            for file in expected_files(&slice, library, version) {
                if !lib_dir.join(&file).exists() {
                    return Err(BuildError::MissingArtifact {
                        arch: stage.arch.clone(),
                        file,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Copy the library headers, keeping their layout. Returns the count.
///
/// # Errors
///
/// Returns [`BuildError::Io`] on copy failure.
pub fn stage_headers(source_dir: &Path, package_dir: &Path) -> Result<usize, BuildError> {
    let header_root = source_dir.join(HEADER_DIR);
    let patterns = compile(HEADER_PATTERNS)?;
    let dest_root = package_dir.join("include").join(HEADER_DIR);

    let mut count = 0;
    for file in collect(&header_root, &patterns) {
        let Ok(rel) = file.strip_prefix(&header_root) else {
            continue;
        };
        let dest = dest_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&file, &dest)?;
        count += 1;
    }
    Ok(count)
}

/// Stage a successful build into `package_dir`.
///
/// Only called once every architecture has built; a partial universal build
/// never reaches packaging.
///
/// # Errors
///
/// Returns [`BuildError::Io`] on copy failure, or a context error when no
/// library was produced at all.
pub fn stage_package(
    build: &BuildOutcome,
    link_mode: LinkMode,
    source_dir: &Path,
    package_dir: &Path,
) -> Result<StagedPackage, BuildError> {
    let mut lib_patterns = compile(STATIC_LIB_PATTERNS)?;
    let bin_patterns = compile(SHARED_BIN_PATTERNS)?;
    if link_mode.is_shared() {
        lib_patterns.extend(compile(SHARED_LIB_PATTERNS)?);
    }

    let mut staged = StagedPackage {
        root: package_dir.to_path_buf(),
        ..StagedPackage::default()
    };

    for stage in &build.stages {
        let mut lib_dest = package_dir.join("lib");
        let mut bin_dest = package_dir.join("bin");
        if build.universal {
            lib_dest.push(&stage.arch);
            bin_dest.push(&stage.arch);
        }

        let libs = collect(&stage.stage_dir, &lib_patterns);
        staged
            .libraries
            .extend(copy_flat(&libs, &lib_dest, package_dir)?);

        if link_mode.is_shared() {
            let bins = collect(&stage.stage_dir, &bin_patterns);
            staged
                .binaries
                .extend(copy_flat(&bins, &bin_dest, package_dir)?);
        }

        tracing::debug!(arch = %stage.arch, libs = libs.len(), "staged architecture");
    }

    if staged.libraries.is_empty() {
        return Err(BuildError::context(
            "No libraries produced",
            build.staging_root.display(),
        ));
    }

    staged.headers = stage_headers(source_dir, package_dir)?;
    tracing::info!(
        libraries = staged.libraries.len(),
        binaries = staged.binaries.len(),
        headers = staged.headers,
        "package staged"
    );
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StagedArch;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn outcome(root: &Path, universal: bool, archs: &[&str]) -> BuildOutcome {
        BuildOutcome {
            universal,
            staging_root: root.to_path_buf(),
            stages: archs
                .iter()
                .map(|a| StagedArch {
                    arch: (*a).to_string(),
                    stage_dir: root.join(a),
                })
                .collect(),
        }
    }

    #[test]
    fn test_static_single_arch() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("build");
        touch(&root.join("x86_64/lib/libboost_system.a"));
        touch(&root.join("x86_64/lib/libboost_system.so"));
        touch(&tmp.path().join("src/boost/filesystem/path.hpp"));
        touch(&tmp.path().join("src/boost/detail/impl.ipp"));
        touch(&tmp.path().join("src/boost/README.txt"));

        let pkg = tmp.path().join("pkg");
        let staged = stage_package(
            &outcome(&root, false, &["x86_64"]),
            LinkMode::Static,
            &tmp.path().join("src"),
            &pkg,
        )
        .unwrap();

        assert_eq!(staged.libraries, [PathBuf::from("lib/libboost_system.a")]);
        assert!(!pkg.join("lib/libboost_system.so").exists());
        assert_eq!(staged.headers, 2);
        assert!(pkg.join("include/boost/filesystem/path.hpp").exists());
        assert!(pkg.join("include/boost/detail/impl.ipp").exists());
        assert!(!pkg.join("include/boost/README.txt").exists());
    }

    #[test]
    fn test_shared_windows_outputs() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("build");
        touch(&root.join("x86_64/lib/boost_system-vc140-mt-1_64.dll"));
        touch(&root.join("x86_64/lib/boost_system-vc140-mt-1_64.lib"));

        let pkg = tmp.path().join("pkg");
        let staged = stage_package(
            &outcome(&root, false, &["x86_64"]),
            LinkMode::Shared,
            tmp.path(),
            &pkg,
        )
        .unwrap();

        assert_eq!(
            staged.binaries,
            [PathBuf::from("bin/boost_system-vc140-mt-1_64.dll")]
        );
        assert!(pkg.join("lib/boost_system-vc140-mt-1_64.lib").exists());
        assert_eq!(staged.headers, 0);
    }

    #[test]
    fn test_universal_stages_per_arch() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("build-universal");
        touch(&root.join("armv7/lib/libboost_system.a"));
        touch(&root.join("arm64/lib/libboost_system.a"));

        let pkg = tmp.path().join("pkg");
        let staged = stage_package(
            &outcome(&root, true, &["armv7", "arm64"]),
            LinkMode::Static,
            tmp.path(),
            &pkg,
        )
        .unwrap();

        assert_eq!(
            staged.libraries,
            [
                PathBuf::from("lib/armv7/libboost_system.a"),
                PathBuf::from("lib/arm64/libboost_system.a"),
            ]
        );
    }

    #[test]
    fn test_verify_outputs_names_missing_file() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("build-universal");
        touch(&root.join("armv7/lib/libboost_system.a"));
        touch(&root.join("armv7/lib/libboost_filesystem.a"));
        touch(&root.join("arm64/lib/libboost_system.a"));

        let platform = PlatformDescriptor::new(
            bpk_schema::Os::Ios,
            bpk_schema::Compiler::new(bpk_schema::CompilerFamily::AppleClang, 9),
            bpk_schema::RuntimeMode::Unspecified,
            "universal",
            bpk_schema::BuildType::Release,
            LinkMode::Static,
        );
        let libraries = vec!["filesystem".to_string(), "system".to_string()];
        let build = outcome(&root, true, &["armv7", "arm64"]);

        let err = verify_outputs(&build, &platform, &libraries, "1.64.0").unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingArtifact { ref arch, ref file }
                if arch == "arm64" && file == "libboost_filesystem.a"
        ));

        touch(&root.join("arm64/lib/libboost_filesystem.a"));
        verify_outputs(&build, &platform, &libraries, "1.64.0").unwrap();
    }

    #[test]
    fn test_empty_build_is_an_error() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("build");
        fs::create_dir_all(root.join("x86_64/lib")).unwrap();
        let err = stage_package(
            &outcome(&root, false, &["x86_64"]),
            LinkMode::Static,
            tmp.path(),
            &tmp.path().join("pkg"),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Context { .. }));
    }
}
