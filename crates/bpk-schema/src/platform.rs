//! Platform descriptors.
//!
//! A [`PlatformDescriptor`] is the normalized description of one build
//! target. Every axis that drives a policy branch (OS, compiler family,
//! runtime mode, build type, link mode) is a closed enum so that adding a
//! platform is a compile-time-checked change.

use serde::{Deserialize, Serialize};

use crate::arch::{self, ArchClass, ArchError};

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    Macos,
    /// GNU/Linux.
    Linux,
    /// Apple iOS (device and simulator).
    #[serde(rename = "iOS")]
    Ios,
    /// Android.
    Android,
    /// FreeBSD.
    #[serde(rename = "FreeBSD")]
    FreeBsd,
}

impl Os {
    /// The OS the current process runs on.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "freebsd") {
            Self::FreeBsd
        } else {
            Self::Linux
        }
    }

    /// Settings-style name (`Macos`, `iOS`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Macos => "Macos",
            Self::Linux => "Linux",
            Self::Ios => "iOS",
            Self::Android => "Android",
            Self::FreeBsd => "FreeBSD",
        }
    }

    /// Value for the build tool's `target-os=` property.
    ///
    /// The lowercased name, except that `macos` is `darwin` and `ios` is
    /// `iphone`.
    pub fn target_os(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "darwin",
            Self::Linux => "linux",
            Self::Ios => "iphone",
            Self::Android => "android",
            Self::FreeBsd => "freebsd",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "macos" | "darwin" | "osx" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            "ios" | "iphone" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "freebsd" => Ok(Self::FreeBsd),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerFamily {
    /// GNU g++.
    Gcc,
    /// LLVM clang++.
    Clang,
    /// Apple's Xcode clang.
    AppleClang,
    /// The Visual Studio (MSVC) toolchain.
    #[serde(rename = "Visual Studio")]
    VisualStudio,
}

impl CompilerFamily {
    /// Default compiler for the host OS.
    pub fn host_default() -> Self {
        match Os::host() {
            Os::Windows => Self::VisualStudio,
            Os::Macos | Os::Ios => Self::AppleClang,
            Os::FreeBsd => Self::Clang,
            Os::Linux | Os::Android => Self::Gcc,
        }
    }

    /// Settings-style name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Clang => "clang",
            Self::AppleClang => "apple-clang",
            Self::VisualStudio => "Visual Studio",
        }
    }

    /// Whether this is the vendor IDE toolchain with its own ABI-tagged
    /// library naming and auto-linking.
    pub fn is_vendor_ide(&self) -> bool {
        matches!(self, Self::VisualStudio)
    }

    /// Whether the family understands clang-specific warning flags.
    pub fn is_clang(&self) -> bool {
        matches!(self, Self::Clang | Self::AppleClang)
    }

    /// Build-tool toolset module that drives this compiler.
    ///
    /// The build tool has no `apple-clang` module; Xcode clang is driven
    /// through the plain `clang` one.
    pub fn toolset_module(&self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Clang | Self::AppleClang => "clang",
            Self::VisualStudio => "msvc",
        }
    }

    /// C++ driver to invoke when `CXX` is not set.
    pub fn default_driver(&self) -> &'static str {
        match self {
            Self::Gcc => "g++",
            Self::Clang | Self::AppleClang => "clang++",
            Self::VisualStudio => "cl",
        }
    }

    /// Major version assumed when none is given.
    pub fn default_version(&self) -> u32 {
        match self {
            Self::Gcc => 7,
            Self::Clang => 5,
            Self::AppleClang => 9,
            Self::VisualStudio => 14,
        }
    }
}

impl std::fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CompilerFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcc" | "g++" => Ok(Self::Gcc),
            "clang" | "clang++" => Ok(Self::Clang),
            "apple-clang" | "apple_clang" | "appleclang" => Ok(Self::AppleClang),
            "visual studio" | "visual-studio" | "msvc" | "vs" => Ok(Self::VisualStudio),
            _ => Err(format!("Unknown compiler: {s}")),
        }
    }
}

/// Compiler family plus major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compiler {
    /// Compiler family.
    pub family: CompilerFamily,
    /// Major version (`14` for Visual Studio 2015, `7` for gcc 7, ...).
    pub version: u32,
}

impl Compiler {
    /// Construct a compiler description.
    pub fn new(family: CompilerFamily, version: u32) -> Self {
        Self { family, version }
    }
}

impl std::fmt::Display for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

/// C/C++ runtime linkage, using the Visual Studio runtime codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RuntimeMode {
    /// Static debug CRT (`MTd`).
    #[serde(rename = "MTd")]
    StaticDebug,
    /// Static release CRT (`MT`).
    #[serde(rename = "MT")]
    StaticRelease,
    /// Dynamic debug CRT (`MDd`).
    #[serde(rename = "MDd")]
    DynamicDebug,
    /// Dynamic release CRT (`MD`).
    #[serde(rename = "MD")]
    DynamicRelease,
    /// Not set (every non-Visual Studio toolchain).
    #[default]
    #[serde(rename = "none")]
    Unspecified,
}

impl RuntimeMode {
    /// Runtime code (`MT`, `MDd`, ...), or `None` when unspecified.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::StaticDebug => Some("MTd"),
            Self::StaticRelease => Some("MT"),
            Self::DynamicDebug => Some("MDd"),
            Self::DynamicRelease => Some("MD"),
            Self::Unspecified => None,
        }
    }

    /// Whether the CRT is linked statically (`MT` / `MTd`).
    pub fn is_static(&self) -> bool {
        matches!(self, Self::StaticDebug | Self::StaticRelease)
    }

    /// Whether a runtime was chosen at all.
    pub fn is_specified(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code().unwrap_or("none"))
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MTd" | "mtd" => Ok(Self::StaticDebug),
            "MT" | "mt" => Ok(Self::StaticRelease),
            "MDd" | "mdd" => Ok(Self::DynamicDebug),
            "MD" | "md" => Ok(Self::DynamicRelease),
            "" | "none" => Ok(Self::Unspecified),
            _ => Err(format!("Unknown runtime: {s}")),
        }
    }
}

/// Build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BuildType {
    /// Unoptimized, with debug info and the debug ABI tag.
    Debug,
    /// Optimized.
    #[default]
    Release,
}

impl BuildType {
    /// Value for the build tool's `variant=` property.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "Debug"),
            Self::Release => write!(f, "Release"),
        }
    }
}

impl std::str::FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            _ => Err(format!("Unknown build type: {s}")),
        }
    }
}

/// Whether the wrapped library is built as static archives or shared objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Static archives (`.a` / `.lib`).
    #[default]
    Static,
    /// Shared objects (`.so` / `.dylib` / `.dll`).
    Shared,
}

impl LinkMode {
    /// Map the recipe's `shared` option.
    pub fn from_shared(shared: bool) -> Self {
        if shared { Self::Shared } else { Self::Static }
    }

    /// Value for the build tool's `link=` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Shared => "shared",
        }
    }

    /// Whether shared objects are produced.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full description of one build target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    /// Target OS.
    pub os: Os,
    /// Compiler family and version.
    pub compiler: Compiler,
    /// CRT linkage; only meaningful for Visual Studio.
    #[serde(default)]
    pub runtime: RuntimeMode,
    /// Raw architecture (`x86_64`, `armv7`, `universal`, ...).
    pub arch: String,
    /// Debug or release.
    #[serde(default)]
    pub build_type: BuildType,
    /// Static or shared.
    #[serde(default)]
    pub link_mode: LinkMode,
}

impl PlatformDescriptor {
    /// Describe a target. The architecture is normalized with
    /// [`arch::normalize`].
    pub fn new(
        os: Os,
        compiler: Compiler,
        runtime: RuntimeMode,
        raw_arch: &str,
        build_type: BuildType,
        link_mode: LinkMode,
    ) -> Self {
        Self {
            os,
            compiler,
            runtime,
            arch: arch::normalize(raw_arch),
            build_type,
            link_mode,
        }
    }

    /// Whether this descriptor targets the universal sentinel.
    pub fn is_universal(&self) -> bool {
        arch::is_universal(&self.arch)
    }

    /// Whether the compiler is the vendor IDE toolchain.
    pub fn is_vendor_ide(&self) -> bool {
        self.compiler.family.is_vendor_ide()
    }

    /// Copy of this descriptor narrowed to one concrete architecture.
    pub fn with_arch(&self, raw_arch: &str) -> Self {
        Self {
            arch: arch::normalize(raw_arch),
            ..self.clone()
        }
    }

    /// Check that the descriptor can be resolved.
    ///
    /// Universal targets are accepted here; their sub-architectures are
    /// validated when the fan-out list is chosen.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::UnknownArchitecture`] if a concrete architecture
    /// cannot be classified.
    pub fn validate(&self) -> Result<(), ArchError> {
        if self.is_universal() {
            return Ok(());
        }
        ArchClass::classify(&self.arch).map(|_| ())
    }
}

impl std::fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.os, self.compiler, self.arch, self.build_type, self.link_mode
        )?;
        if let Some(code) = self.runtime.code() {
            write!(f, " {code}")?;
        }
        Ok(())
    }
}
