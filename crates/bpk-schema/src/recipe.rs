//! Recipe manifests.
//!
//! A recipe names the upstream release to fetch, the sub-libraries to build
//! and the fan-out list used for universal targets. Recipes are plain TOML:
//!
//! ```toml
//! name = "boost"
//! version = "1.64.0"
//! license = "BSL"
//! url = "https://archives.boost.io/release/1.64.0/source/boost_1_64_0.tar.gz"
//! libraries = ["filesystem", "system"]
//!
//! [options]
//! shared = false
//!
//! [platform]
//! os = "Linux"
//! arch = "x86_64"
//! compiler = { family = "gcc", version = 7 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arch::DEFAULT_UNIVERSAL_ARCHS;
use crate::platform::{LinkMode, PlatformDescriptor};

/// Errors that can occur when loading a recipe.
#[derive(thiserror::Error, Debug)]
pub enum RecipeError {
    /// The recipe file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content is not a valid recipe.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The recipe parsed but is unusable.
    #[error("Invalid recipe: {0}")]
    Invalid(String),
}

/// Package options exposed to consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOptions {
    /// Build shared libraries instead of static archives.
    #[serde(default)]
    pub shared: bool,
}

/// A packaging recipe for one upstream release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package name.
    pub name: String,
    /// Upstream release version.
    pub version: semver::Version,
    /// SPDX-ish license tag.
    #[serde(default)]
    pub license: String,
    /// Source archive URL (`.tar.gz` or `.zip`).
    pub url: String,
    /// Expected SHA-256 of the archive, when pinned.
    #[serde(default)]
    pub sha256: Option<String>,
    /// Sub-libraries to build, in declaration order.
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,
    /// Concrete architectures a universal target expands to, in build order.
    #[serde(default = "default_universal_archs")]
    pub universal_archs: Vec<String>,
    /// Default package options.
    #[serde(default)]
    pub options: RecipeOptions,
    /// Optional pinned target platform.
    #[serde(default)]
    pub platform: Option<PlatformDescriptor>,
}

fn default_libraries() -> Vec<String> {
    vec!["filesystem".to_string(), "system".to_string()]
}

fn default_universal_archs() -> Vec<String> {
    DEFAULT_UNIVERSAL_ARCHS.iter().map(ToString::to_string).collect()
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            name: "boost".to_string(),
            version: semver::Version::new(1, 64, 0),
            license: "BSL".to_string(),
            url: "https://archives.boost.io/release/1.64.0/source/boost_1_64_0.tar.gz"
                .to_string(),
            sha256: None,
            libraries: default_libraries(),
            universal_archs: default_universal_archs(),
            options: RecipeOptions::default(),
            platform: None,
        }
    }
}

impl Recipe {
    /// Parse a recipe from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Parse`] on malformed TOML and
    /// [`RecipeError::Invalid`] when the library or fan-out list is empty.
    pub fn from_toml_str(content: &str) -> Result<Self, RecipeError> {
        let recipe: Self = toml::from_str(content)?;
        recipe.check()?;
        Ok(recipe)
    }

    /// Load a recipe from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Recipe::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn check(&self) -> Result<(), RecipeError> {
        if self.libraries.is_empty() {
            return Err(RecipeError::Invalid("libraries must not be empty".into()));
        }
        if self.universal_archs.is_empty() {
            return Err(RecipeError::Invalid(
                "universal_archs must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// `major.minor`, the version form used in Windows library names.
    pub fn short_version(&self) -> String {
        format!("{}.{}", self.version.major, self.version.minor)
    }

    /// Directory the source archive unpacks to (`boost_1_64_0`).
    pub fn source_dir_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.name, self.version.major, self.version.minor, self.version.patch
        )
    }

    /// Link mode selected by the `shared` option.
    pub fn link_mode(&self) -> LinkMode {
        LinkMode::from_shared(self.options.shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_recipe() {
        let recipe = Recipe::default();
        assert_eq!(recipe.source_dir_name(), "boost_1_64_0");
        assert_eq!(recipe.short_version(), "1.64");
        assert_eq!(recipe.libraries, ["filesystem", "system"]);
        assert_eq!(recipe.link_mode(), LinkMode::Static);
    }

    #[test]
    fn test_parse_minimal() {
        let recipe = Recipe::from_toml_str(
            r#"
            name = "boost"
            version = "1.66.0"
            url = "https://example.com/boost_1_66_0.tar.gz"

            [options]
            shared = true
            "#,
        )
        .unwrap();
        assert_eq!(recipe.source_dir_name(), "boost_1_66_0");
        assert_eq!(recipe.universal_archs.len(), DEFAULT_UNIVERSAL_ARCHS.len());
        assert_eq!(recipe.link_mode(), LinkMode::Shared);
        assert!(recipe.platform.is_none());
    }

    #[test]
    fn test_parse_with_platform() {
        let recipe = Recipe::from_toml_str(
            r#"
            name = "boost"
            version = "1.64.0"
            url = "https://example.com/boost.tar.gz"
            universal_archs = ["arm64", "x86_64"]

            [platform]
            os = "Macos"
            arch = "universal"
            compiler = { family = "apple-clang", version = 9 }
            "#,
        )
        .unwrap();
        let platform = recipe.platform.unwrap();
        assert!(platform.is_universal());
        assert_eq!(recipe.universal_archs, ["arm64", "x86_64"]);
    }

    #[test]
    fn test_empty_libraries_rejected() {
        let err = Recipe::from_toml_str(
            r#"
            name = "boost"
            version = "1.64.0"
            url = "https://example.com/boost.tar.gz"
            libraries = []
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RecipeError::Invalid(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.toml");
        std::fs::write(
            &path,
            "name = \"boost\"\nversion = \"1.64.0\"\nurl = \"https://example.com/b.zip\"\n",
        )
        .unwrap();
        assert_eq!(Recipe::load(&path).unwrap().name, "boost");
        assert!(matches!(
            Recipe::load(&dir.path().join("missing.toml")),
            Err(RecipeError::Io(_))
        ));
    }
}
