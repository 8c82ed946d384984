//! Consumer link metadata.
//!
//! Tells downstream projects which libraries to link and which preprocessor
//! defines select the right linkage in the library headers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bpk_schema::PlatformDescriptor;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::naming::{LIBRARY_FAMILY, artifact_name};

/// File the metadata is written to inside a staged package.
pub const PACKAGE_INFO_FILE: &str = "package-info.json";

/// Headers link against shared objects.
pub const DEFINE_DYN_LINK: &str = "BOOST_ALL_DYN_LINK";
/// Headers link against static archives.
pub const DEFINE_STATIC_LIBS: &str = "BOOST_USE_STATIC_LIBS";
/// Disables Visual Studio `#pragma comment(lib, ...)` auto-linking.
pub const DEFINE_NO_LIB: &str = "BOOST_ALL_NO_LIB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    /// Link names in declared library order.
    pub libs: Vec<String>,
    pub defines: BTreeSet<String>,
}

impl LinkMetadata {
    /// Write `package-info.json` into `package_dir`.
    pub fn write(&self, package_dir: &Path) -> Result<PathBuf, BuildError> {
        std::fs::create_dir_all(package_dir)?;
        let path = package_dir.join(PACKAGE_INFO_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Link metadata for `libraries` built for `platform`.
pub fn link_metadata(
    platform: &PlatformDescriptor,
    libraries: &[String],
    version: &str,
) -> LinkMetadata {
    let mut defines = BTreeSet::new();
    if platform.link_mode.is_shared() {
        defines.insert(DEFINE_DYN_LINK.to_string());
    } else {
        defines.insert(DEFINE_STATIC_LIBS.to_string());
    }

    let libs = if platform.is_vendor_ide() {
        defines.insert(DEFINE_NO_LIB.to_string());
        libraries
            .iter()
            .map(|lib| artifact_name(platform, lib, version).stem())
            .collect()
    } else {
        libraries
            .iter()
            .map(|lib| format!("{LIBRARY_FAMILY}_{lib}"))
            .collect()
    };

    LinkMetadata { libs, defines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpk_schema::{BuildType, Compiler, CompilerFamily, LinkMode, Os, RuntimeMode};

    fn libraries() -> Vec<String> {
        vec!["filesystem".into(), "system".into()]
    }

    fn desc(family: CompilerFamily, link_mode: LinkMode) -> PlatformDescriptor {
        let os = if family.is_vendor_ide() { Os::Windows } else { Os::Linux };
        PlatformDescriptor::new(
            os,
            Compiler::new(family, 14),
            RuntimeMode::Unspecified,
            "x86_64",
            BuildType::Release,
            link_mode,
        )
    }

    #[test]
    fn test_shared_defines() {
        let meta = link_metadata(&desc(CompilerFamily::Gcc, LinkMode::Shared), &libraries(), "1.64");
        assert!(meta.defines.contains(DEFINE_DYN_LINK));
        assert!(!meta.defines.contains(DEFINE_STATIC_LIBS));
        assert!(!meta.defines.contains(DEFINE_NO_LIB));
    }

    #[test]
    fn test_static_defines() {
        let meta = link_metadata(&desc(CompilerFamily::Clang, LinkMode::Static), &libraries(), "1.64");
        assert!(meta.defines.contains(DEFINE_STATIC_LIBS));
        assert!(!meta.defines.contains(DEFINE_DYN_LINK));
    }

    #[test]
    fn test_unix_library_names() {
        let meta = link_metadata(&desc(CompilerFamily::Gcc, LinkMode::Static), &libraries(), "1.64");
        assert_eq!(meta.libs, ["boost_filesystem", "boost_system"]);
    }

    #[test]
    fn test_visual_studio_uses_abi_names_and_no_lib() {
        let mut platform = desc(CompilerFamily::VisualStudio, LinkMode::Static);
        platform.runtime = RuntimeMode::StaticDebug;
        platform.build_type = BuildType::Debug;

        let meta = link_metadata(&platform, &libraries(), "1.64.0");
        assert_eq!(
            meta.libs,
            [
                "libboost_filesystem-vc140-mt-sgd-1_64",
                "libboost_system-vc140-mt-sgd-1_64"
            ]
        );
        assert!(meta.defines.contains(DEFINE_NO_LIB));
        assert!(meta.defines.contains(DEFINE_STATIC_LIBS));
    }

    #[test]
    fn test_write_and_read() {
        let tmp = tempfile::tempdir().unwrap();
        let meta = link_metadata(&desc(CompilerFamily::Gcc, LinkMode::Shared), &libraries(), "1.64");
        let path = meta.write(tmp.path()).unwrap();
        assert!(path.ends_with(PACKAGE_INFO_FILE));
        assert_eq!(LinkMetadata::read(&path).unwrap(), meta);
    }
}
