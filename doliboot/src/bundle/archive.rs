//! Bundle archive extraction.
//!
//! The release ships as a zip; gzip tarballs are accepted too. The format is
//! detected from the leading magic bytes, not the file name.

use doliboot_shared::errors::{BootError, BootResult};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::Archive;
use zip::ZipArchive;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

/// Detect the archive format from its first bytes.
pub fn detect(archive: &Path) -> BootResult<ArchiveKind> {
    let file = File::open(archive).map_err(|e| {
        BootError::Archive(format!("Failed to open bundle {}: {}", archive.display(), e))
    })?;

    let mut header = Vec::with_capacity(ZIP_MAGIC.len());
    file.take(ZIP_MAGIC.len() as u64)
        .read_to_end(&mut header)
        .map_err(|e| BootError::Archive(format!("Failed to read bundle header: {}", e)))?;

    if header.starts_with(&ZIP_MAGIC) {
        Ok(ArchiveKind::Zip)
    } else if header.starts_with(&GZIP_MAGIC) {
        Ok(ArchiveKind::TarGz)
    } else {
        Err(BootError::Archive(format!(
            "Unrecognized bundle format: {}",
            archive.display()
        )))
    }
}

/// Extract `archive` into `dest`, keeping the permission bits it records.
pub fn extract(archive: &Path, dest: &Path) -> BootResult<ArchiveKind> {
    let kind = detect(archive)?;
    tracing::info!(
        archive = %archive.display(),
        dest = %dest.display(),
        ?kind,
        "Extracting bundle"
    );

    let file = File::open(archive).map_err(|e| {
        BootError::Archive(format!("Failed to open bundle {}: {}", archive.display(), e))
    })?;

    match kind {
        ArchiveKind::Zip => {
            let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| {
                BootError::Archive(format!("Failed to read zip {}: {}", archive.display(), e))
            })?;
            zip.extract(dest).map_err(|e| {
                BootError::Archive(format!(
                    "Failed to extract {} into {}: {}",
                    archive.display(),
                    dest.display(),
                    e
                ))
            })?;
        }
        ArchiveKind::TarGz => {
            let mut tar = Archive::new(GzDecoder::new(BufReader::new(file)));
            tar.set_preserve_permissions(true);
            tar.unpack(dest).map_err(|e| {
                BootError::Archive(format!(
                    "Failed to extract {} into {}: {}",
                    archive.display(),
                    dest.display(),
                    e
                ))
            })?;
        }
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_zip(path: &Path) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        zip.add_directory("dolibarr-1.0/htdocs/", FileOptions::default())
            .unwrap();
        zip.start_file(
            "dolibarr-1.0/htdocs/index.php",
            FileOptions::default().unix_permissions(0o640),
        )
        .unwrap();
        zip.write_all(b"<?php").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bundle.zip");
        write_zip(&archive);

        let dest = temp.path().join("out");
        assert_eq!(extract(&archive, &dest).unwrap(), ArchiveKind::Zip);

        let index = dest.join("dolibarr-1.0/htdocs/index.php");
        assert_eq!(std::fs::read_to_string(&index).unwrap(), "<?php");
        let mode = std::fs::metadata(&index).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_extract_tar_gz() {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join("tree");
        std::fs::create_dir_all(tree.join("scripts")).unwrap();
        std::fs::write(tree.join("scripts/cron.sh"), "#!/bin/sh").unwrap();

        let archive = temp.path().join("bundle.tgz");
        let encoder = GzEncoder::new(File::create(&archive).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all("dolibarr-1.0", &tree).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = temp.path().join("out");
        assert_eq!(extract(&archive, &dest).unwrap(), ArchiveKind::TarGz);
        assert!(dest.join("dolibarr-1.0/scripts/cron.sh").is_file());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bundle.bin");
        std::fs::write(&archive, b"not an archive").unwrap();
        assert!(matches!(detect(&archive), Err(BootError::Archive(_))));
    }

    #[test]
    fn test_missing_archive_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let err = extract(&temp.path().join("none.zip"), temp.path()).unwrap_err();
        assert!(matches!(err, BootError::Archive(_)));
    }
}
