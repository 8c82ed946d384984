//! Source archive download with streaming SHA256 verification.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// Download `url` to `dest`, hashing as we stream.
///
/// When `expected_hash` is given and does not match, the partial file is
/// removed. Returns the hex SHA256 of the downloaded bytes either way.
pub async fn download_and_verify(
    client: &Client,
    url: &str,
    dest: &Path,
    expected_hash: Option<&str>,
) -> Result<String, DownloadError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
    }

    file.flush().await?;
    let actual_hash = hex::encode(hasher.finalize());
    tracing::debug!(url, bytes = downloaded, sha256 = %actual_hash, "download complete");

    if let Some(expected) = expected_hash {
        if !actual_hash.eq_ignore_ascii_case(expected) {
            tokio::fs::remove_file(dest).await.ok();
            return Err(DownloadError::HashMismatch {
                expected: expected.to_string(),
                actual: actual_hash,
            });
        }
    }

    Ok(actual_hash)
}
