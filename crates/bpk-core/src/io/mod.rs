//! Fetch-and-extract of the upstream source tree.

pub mod download;
pub mod extract;

use std::path::{Path, PathBuf};

use bpk_schema::Recipe;
use reqwest::Client;

use crate::error::BuildError;
use crate::paths::filename_from_url;

/// Make sure `<work_dir>/<source dir>` exists, downloading and unpacking the
/// recipe's archive if it does not. Returns the source directory.
///
/// The archive is unpacked into a scratch directory under `work_dir` and the
/// source tree is moved into place only once extraction completed, so a
/// present source directory is always a complete one.
///
/// There is no retry; a failed download or extraction aborts.
pub async fn fetch_source(
    client: &Client,
    recipe: &Recipe,
    work_dir: &Path,
) -> Result<PathBuf, BuildError> {
    let source_dir = work_dir.join(recipe.source_dir_name());
    if source_dir.is_dir() {
        tracing::info!(path = %source_dir.display(), "source tree already present");
        return Ok(source_dir);
    }

    let file_name = filename_from_url(&recipe.url);
    if file_name.is_empty() {
        return Err(BuildError::context("Invalid source URL", &recipe.url));
    }
    std::fs::create_dir_all(work_dir)?;
    let archive = work_dir.join(file_name);

    tracing::info!(url = %recipe.url, "downloading source archive");
    download::download_and_verify(client, &recipe.url, &archive, recipe.sha256.as_deref())
        .await?;

    let scratch = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(work_dir)?;
    let dest = scratch.path().to_path_buf();
    let archive_for_task = archive.clone();
    let extracted =
        tokio::task::spawn_blocking(move || extract::extract_archive(&archive_for_task, &dest))
            .await
            .map_err(|e| BuildError::context("Extraction task failed", e));

    std::fs::remove_file(&archive).ok();
    extracted??;

    let unpacked = scratch.path().join(recipe.source_dir_name());
    if !unpacked.is_dir() {
        return Err(BuildError::context(
            "Archive did not contain the expected source directory",
            source_dir.display(),
        ));
    }
    std::fs::rename(&unpacked, &source_dir)?;
    Ok(source_dir)
}
