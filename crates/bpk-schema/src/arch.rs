//! CPU architecture classification.
//!
//! Raw architecture strings come straight from the platform settings
//! (`x86_64`, `armv7s`, `i386`, `universal`, ...). The build tool only
//! understands a family (`x86` / `arm`) and an address model (`32` / `64`),
//! so every raw string is classified on demand rather than stored.
//!
//! # Example
//!
//! ```
//! use bpk_schema::arch::{self, AddressWidth, ArchFamily};
//!
//! assert_eq!(arch::classify_family("armv7").unwrap(), ArchFamily::Arm);
//! assert_eq!(arch::address_width("x86_64"), AddressWidth::Bits64);
//! assert!(arch::classify_family("mips").is_err());
//! ```

use serde::{Deserialize, Serialize};

/// Sentinel raw architecture for a multi-slice ("fat") build.
pub const UNIVERSAL: &str = "universal";

/// Sub-architectures a universal build fans out to, in build order.
pub const DEFAULT_UNIVERSAL_ARCHS: [&str; 5] = ["armv7", "armv7s", "arm64", "i386", "x86_64"];

/// Errors raised while classifying a raw architecture string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchError {
    /// The string does not start with any known family prefix.
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),
}

/// Instruction set family as the build tool names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchFamily {
    /// Intel/AMD (`i386`, `x86`, `x86_64`).
    X86,
    /// ARM (`armv7`, `armv7s`, `arm64`, `aarch64`).
    Arm,
}

impl ArchFamily {
    /// Value for the build tool's `architecture=` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Arm => "arm",
        }
    }
}

impl std::fmt::Display for ArchFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pointer width of a concrete architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressWidth {
    /// 32-bit address model.
    Bits32,
    /// 64-bit address model.
    Bits64,
}

impl AddressWidth {
    /// Width in bits.
    pub fn bits(&self) -> u8 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }
}

impl std::fmt::Display for AddressWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Family and width of a concrete architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchClass {
    /// Instruction set family.
    pub family: ArchFamily,
    /// Address model.
    pub address_width: AddressWidth,
}

impl ArchClass {
    /// Classify a raw architecture string.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::UnknownArchitecture`] if the family cannot be
    /// determined.
    pub fn classify(raw: &str) -> Result<Self, ArchError> {
        Ok(Self {
            family: classify_family(raw)?,
            address_width: address_width(raw),
        })
    }
}

/// Map a raw architecture string to its family by prefix.
///
/// There is no fallback: anything that is not `x86*`, `i386*`, `arm*` or
/// `aarch*` is rejected.
///
/// # Errors
///
/// Returns [`ArchError::UnknownArchitecture`] for any other prefix.
pub fn classify_family(raw: &str) -> Result<ArchFamily, ArchError> {
    if raw.starts_with("x86") || raw.starts_with("i386") {
        Ok(ArchFamily::X86)
    } else if raw.starts_with("arm") || raw.starts_with("aarch") {
        Ok(ArchFamily::Arm)
    } else {
        Err(ArchError::UnknownArchitecture(raw.to_string()))
    }
}

/// Address width of a raw architecture string.
///
/// Only `x86_64` and `arm64` are 64-bit; everything else is treated as 32-bit.
/// Callers still need [`classify_family`] to reject unknown strings.
pub fn address_width(raw: &str) -> AddressWidth {
    match raw {
        "x86_64" | "arm64" => AddressWidth::Bits64,
        _ => AddressWidth::Bits32,
    }
}

/// Whether the raw architecture is the universal sentinel.
pub fn is_universal(raw: &str) -> bool {
    raw == UNIVERSAL
}

/// Canonicalise user-supplied spellings (`aarch64`, `amd64`, `X86_64`) to the
/// names the classifier and staging layout expect.
pub fn normalize(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "aarch64" => "arm64".to_string(),
        "amd64" | "x64" => "x86_64".to_string(),
        "x86" | "i686" => "i386".to_string(),
        _ => lower,
    }
}
