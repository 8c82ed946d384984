//! Command modules - one file per CLI command

pub mod build;
pub mod completions;
pub mod flags;
pub mod info;
pub mod names;
