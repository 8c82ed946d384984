//! Expected artifact file names.
//!
//! On every toolchain except Visual Studio the build tool uses the "system"
//! layout: `libboost_<name>` plus the platform extension. Visual Studio
//! builds use the "versioned" layout, which embeds the toolset, runtime and
//! version in the name so that auto-linking can pick the right binary:
//!
//! ```text
//! libboost_filesystem-vc140-mt-sgd-1_64.lib
//! ^^^ ^^^^^^^^^^^^^^^^ ^^^^^ ^^ ^^^ ^^^^
//!  |        base         |    |  |    version
//!  |                     |    |  abi tags (static CRT, debug)
//!  static only           |    runtime code (threading)
//!                        toolset (major * 10)
//! ```

use bpk_schema::{BuildType, LinkMode, Os, PlatformDescriptor};

/// Library family prefix shared by every tracked library.
pub const LIBRARY_FAMILY: &str = "boost";

/// Threading/runtime code; only multithreaded builds are produced.
const RUNTIME_CODE: &str = "mt";

/// Decomposed artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// `"lib"` or `""`.
    pub prefix: &'static str,
    /// `boost_<name>`.
    pub base: String,
    /// ABI suffix; empty outside Visual Studio.
    pub suffix: String,
}

impl ArtifactName {
    /// File name without extension.
    pub fn stem(&self) -> String {
        if self.suffix.is_empty() {
            format!("{}{}", self.prefix, self.base)
        } else {
            format!("{}{}-{}", self.prefix, self.base, self.suffix)
        }
    }

    /// File name with the given extension (without the dot).
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.stem())
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stem())
    }
}

/// `1.64.0` or `1.64` → `1_64`.
fn version_tag(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join("_")
}

/// Name of the artifact built for `library` on `platform`.
///
/// Call once per library.
pub fn artifact_name(platform: &PlatformDescriptor, library: &str, version: &str) -> ArtifactName {
    let base = format!("{LIBRARY_FAMILY}_{library}");

    if !platform.is_vendor_ide() {
        return ArtifactName {
            prefix: "lib",
            base,
            suffix: String::new(),
        };
    }

    let prefix = match platform.link_mode {
        LinkMode::Static => "lib",
        LinkMode::Shared => "",
    };

    let mut abi = String::new();
    if platform.runtime.is_static() {
        abi.push('s');
    }
    if platform.build_type == BuildType::Debug {
        abi.push_str("gd");
    }
    let abi = if abi.is_empty() { abi } else { format!("-{abi}") };

    let suffix = format!(
        "vc{}-{RUNTIME_CODE}{abi}-{}",
        platform.compiler.version.saturating_mul(10),
        version_tag(version)
    );

    ArtifactName {
        prefix,
        base,
        suffix,
    }
}

/// Every file a successful build is expected to produce for `library`.
///
/// Shared Windows builds yield the DLL plus its import library.
pub fn expected_files(platform: &PlatformDescriptor, library: &str, version: &str) -> Vec<String> {
    let name = artifact_name(platform, library, version);

    match (platform.link_mode, platform.is_vendor_ide()) {
        (LinkMode::Static, true) => vec![name.file_name("lib")],
        (LinkMode::Static, false) => vec![name.file_name("a")],
        (LinkMode::Shared, true) => vec![name.file_name("dll"), name.file_name("lib")],
        (LinkMode::Shared, false) => {
            let ext = match platform.os {
                Os::Macos | Os::Ios => "dylib",
                Os::Windows => "dll",
                Os::Linux | Os::Android | Os::FreeBsd => "so",
            };
            vec![name.file_name(ext)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpk_schema::{Compiler, CompilerFamily, RuntimeMode};

    fn vs14(link_mode: LinkMode, build_type: BuildType, runtime: RuntimeMode) -> PlatformDescriptor {
        PlatformDescriptor::new(
            Os::Windows,
            Compiler::new(CompilerFamily::VisualStudio, 14),
            runtime,
            "x86_64",
            build_type,
            link_mode,
        )
    }

    #[test]
    fn test_vs_static_debug_static_crt() {
        let name = artifact_name(
            &vs14(LinkMode::Static, BuildType::Debug, RuntimeMode::StaticDebug),
            "filesystem",
            "1.64",
        );
        assert_eq!(name.suffix, "vc140-mt-sgd-1_64");
        assert_eq!(name.prefix, "lib");
        assert_eq!(name.stem(), "libboost_filesystem-vc140-mt-sgd-1_64");
    }

    #[test]
    fn test_vs_shared_release_dynamic_crt() {
        let name = artifact_name(
            &vs14(LinkMode::Shared, BuildType::Release, RuntimeMode::DynamicRelease),
            "system",
            "1.64",
        );
        assert_eq!(name.suffix, "vc140-mt-1_64");
        assert_eq!(name.prefix, "");
        assert_eq!(name.to_string(), "boost_system-vc140-mt-1_64");
    }

    #[test]
    fn test_vs_abi_tag_combinations() {
        let cases = [
            (BuildType::Release, RuntimeMode::StaticRelease, "vc140-mt-s-1_64"),
            (BuildType::Debug, RuntimeMode::DynamicDebug, "vc140-mt-gd-1_64"),
            (BuildType::Debug, RuntimeMode::StaticDebug, "vc140-mt-sgd-1_64"),
            (BuildType::Release, RuntimeMode::Unspecified, "vc140-mt-1_64"),
        ];
        for (build_type, runtime, expected) in cases {
            let name = artifact_name(&vs14(LinkMode::Static, build_type, runtime), "system", "1.64.0");
            assert_eq!(name.suffix, expected);
        }
    }

    #[test]
    fn test_vs_version_scaling() {
        let mut desc = vs14(LinkMode::Static, BuildType::Release, RuntimeMode::DynamicRelease);
        desc.compiler.version = 15;
        assert_eq!(artifact_name(&desc, "system", "1.66").suffix, "vc150-mt-1_66");
    }

    #[test]
    fn test_vs_version_does_not_overflow() {
        let mut desc = vs14(LinkMode::Static, BuildType::Release, RuntimeMode::DynamicRelease);
        desc.compiler.version = u32::MAX;
        let suffix = artifact_name(&desc, "system", "1.64").suffix;
        assert_eq!(suffix, format!("vc{}-mt-1_64", u32::MAX));
    }

    #[test]
    fn test_unix_names_are_undecorated() {
        for link_mode in [LinkMode::Static, LinkMode::Shared] {
            let desc = PlatformDescriptor::new(
                Os::Linux,
                Compiler::new(CompilerFamily::Gcc, 7),
                RuntimeMode::Unspecified,
                "x86_64",
                BuildType::Debug,
                link_mode,
            );
            let name = artifact_name(&desc, "filesystem", "1.64");
            assert_eq!(name.stem(), "libboost_filesystem");
            assert!(name.suffix.is_empty());
        }
    }

    #[test]
    fn test_expected_files() {
        let linux_shared = PlatformDescriptor::new(
            Os::Linux,
            Compiler::new(CompilerFamily::Gcc, 7),
            RuntimeMode::Unspecified,
            "x86_64",
            BuildType::Release,
            LinkMode::Shared,
        );
        assert_eq!(
            expected_files(&linux_shared, "system", "1.64"),
            ["libboost_system.so"]
        );

        let mac_static = PlatformDescriptor {
            os: Os::Macos,
            link_mode: LinkMode::Static,
            ..linux_shared.clone()
        };
        assert_eq!(expected_files(&mac_static, "system", "1.64"), ["libboost_system.a"]);

        let mac_shared = PlatformDescriptor {
            os: Os::Macos,
            ..linux_shared
        };
        assert_eq!(
            expected_files(&mac_shared, "system", "1.64"),
            ["libboost_system.dylib"]
        );

        let vs_shared = vs14(LinkMode::Shared, BuildType::Release, RuntimeMode::DynamicRelease);
        assert_eq!(
            expected_files(&vs_shared, "system", "1.64"),
            ["boost_system-vc140-mt-1_64.dll", "boost_system-vc140-mt-1_64.lib"]
        );
    }
}
