//! Errors raised while resolving, building and packaging a recipe.

use bpk_schema::{ArchError, RecipeError};
use thiserror::Error;

use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;

/// The external step a failure is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStage {
    /// The one-time `bootstrap` of the shared source tree.
    Bootstrap,
    /// The build of one concrete architecture.
    Build {
        /// Architecture whose build failed.
        arch: String,
    },
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bootstrap => write!(f, "bootstrap"),
            Self::Build { arch } => write!(f, "build ({arch})"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    /// Nonzero exit (or death by signal, `code == None`) of an external step.
    #[error("{stage} {}", exit_text(.code))]
    ExternalBuildFailure {
        stage: BuildStage,
        code: Option<i32>,
    },

    /// A build exited cleanly but an expected library file is missing.
    #[error("build ({arch}) did not produce {file}")]
    MissingArtifact { arch: String, file: String },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

fn exit_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("failed with exit code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl BuildError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }

    /// The failing stage, for external build failures.
    pub fn stage(&self) -> Option<&BuildStage> {
        match self {
            Self::ExternalBuildFailure { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl From<ArchError> for BuildError {
    fn from(err: ArchError) -> Self {
        match err {
            ArchError::UnknownArchitecture(raw) => Self::UnknownArchitecture(raw),
        }
    }
}
