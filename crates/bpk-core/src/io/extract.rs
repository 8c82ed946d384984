//! Archive extraction module
//!
//! Handles the tar.gz, tar and zip source archives upstream publishes.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Source archive formats we can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

/// Detect archive format from file extension
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let path_str = path.to_string_lossy().to_lowercase();

    if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
        Some(ArchiveFormat::TarGz)
    } else if path_str.ends_with(".tar") {
        Some(ArchiveFormat::Tar)
    } else if path_str.ends_with(".zip") {
        Some(ArchiveFormat::Zip)
    } else {
        None
    }
}

/// Extract an archive, auto-detecting format. Returns the number of files
/// written.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let format = detect_format(archive_path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(archive_path.display().to_string()))?;

    let count = match format {
        ArchiveFormat::TarGz => {
            let reader = BufReader::new(File::open(archive_path)?);
            extract_tar(flate2::read::GzDecoder::new(reader), dest_dir)?
        }
        ArchiveFormat::Tar => extract_tar(BufReader::new(File::open(archive_path)?), dest_dir)?,
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir)?,
    };

    tracing::debug!(
        archive = %archive_path.display(),
        files = count,
        "extracted source archive"
    );
    Ok(count)
}

/// Extract a tar stream, keeping file modes so that bootstrap scripts stay
/// executable.
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<usize, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut count = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;

        if entry.header().entry_type().is_dir() {
            continue;
        }

        let relative_path: PathBuf = entry.path()?.components().collect();
        let absolute_path = dest_dir.join(&relative_path);

        // Sanitize path to prevent Zip Slip
        if !absolute_path.starts_with(dest_dir)
            || relative_path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                relative_path.display()
            )));
        }

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&absolute_path)?;
        count += 1;
    }

    Ok(count)
}

/// Extract a zip archive
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut count = 0;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            continue;
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }

        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8], u32)]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("boost_1_64_0.tar.gz")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(detect_format(Path::new("BOOST.ZIP")), Some(ArchiveFormat::Zip));
        assert_eq!(detect_format(Path::new("boost.tar")), Some(ArchiveFormat::Tar));
        assert_eq!(detect_format(Path::new("boost.tar.bz2")), None);
    }

    #[test]
    fn test_extract_tar_gz_keeps_layout() {
        let tmp = tempdir().unwrap();
        let archive = tmp.path().join("boost_1_64_0.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("boost_1_64_0/bootstrap.sh", b"#!/bin/sh\n", 0o755),
                ("boost_1_64_0/boost/config.hpp", b"// config\n", 0o644),
            ],
        );

        let dest = tmp.path().join("out");
        let count = extract_archive(&archive, &dest).unwrap();
        assert_eq!(count, 2);
        assert!(dest.join("boost_1_64_0/boost/config.hpp").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dest.join("boost_1_64_0/bootstrap.sh"))
                .unwrap()
                .permissions()
                .mode();
            assert_ne!(mode & 0o111, 0);
        }
    }

    #[test]
    fn test_unsupported_format() {
        let tmp = tempdir().unwrap();
        let archive = tmp.path().join("boost.tar.bz2");
        fs::write(&archive, b"BZh").unwrap();
        assert!(matches!(
            extract_archive(&archive, tmp.path()),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }
}
