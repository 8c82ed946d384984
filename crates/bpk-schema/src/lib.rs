//! Shared data types for bpk: platform descriptors, architecture
//! classification and recipe manifests.

pub mod arch;
pub mod platform;
pub mod recipe;

// Re-exports
pub use arch::{AddressWidth, ArchClass, ArchError, ArchFamily};
pub use platform::*;
pub use recipe::{Recipe, RecipeError, RecipeOptions};
