//! Archive extraction for collection archives.
//!
//! Extracts `.zip` archives to a target directory with path traversal
//! protection to prevent zip-slip attacks.

use log::trace;
use std::fs;
use std::io;
use std::path::Path;

/// Trait for extracting collection archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use native_provisioner::artefact::extraction::ZipExtractor;
///
/// let extractor = ZipExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the archive-relative paths of the extracted files.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Malformed`] if the archive cannot be
    /// decoded, [`ExtractionError::PathTraversal`] if an entry would escape
    /// `dest_dir`, [`ExtractionError::EmptyArchive`] if no files are found,
    /// and [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The bytes are not a readable zip archive.
    #[error("malformed archive: {0}")]
    Malformed(String),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(source) => read_failure(source),
            other => Self::Malformed(other.to_string()),
        }
    }
}

/// Classify an error raised while reading archive data.
///
/// Undecodable or truncated data is a property of the archive; anything else
/// is a local I/O failure.
fn read_failure(err: io::Error) -> ExtractionError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
            ExtractionError::Malformed(err.to_string())
        }
        _ => ExtractionError::Io(err),
    }
}

/// Default extractor using the `zip` crate.
///
/// Validates each entry path before extraction to guard against path
/// traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let Some(relative) = entry.enclosed_name() else {
                return Err(ExtractionError::PathTraversal {
                    path: entry.name().to_owned(),
                });
            };

            let dest_path = dest_dir.join(&relative);
            if entry.is_dir() {
                fs::create_dir_all(&dest_path)?;
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out = fs::File::create(&dest_path)?;
            io::copy(&mut entry, &mut out).map_err(read_failure)?;
            trace!("extracted {}", relative.display());
            extracted.push(entry.name().to_owned());
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests abort on fixture setup failures"
    )]

    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(contents).expect("write entry");
        }
        writer.finish().expect("finish archive");
    }

    #[test]
    fn extract_real_archive() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("all.zip");
        let dest_dir = temp_dir.path().join("out");

        write_zip(
            &archive_path,
            &[("x86_64-apple-darwin/release/libfoo.dylib", b"mach-o")],
        );

        let files = ZipExtractor
            .extract(&archive_path, &dest_dir)
            .expect("extract");
        assert_eq!(files, vec!["x86_64-apple-darwin/release/libfoo.dylib"]);
        let extracted = dest_dir.join("x86_64-apple-darwin/release/libfoo.dylib");
        assert_eq!(fs::read(extracted).expect("read extracted"), b"mach-o");
    }

    #[test]
    fn rejects_path_traversal() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("all.zip");
        let dest_dir = temp_dir.path().join("out");
        write_zip(&archive_path, &[("../escape.txt", b"nope")]);

        let result = ZipExtractor.extract(&archive_path, &dest_dir);
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { ref path }) if path == "../escape.txt"),
            "unexpected result: {result:?}"
        );
        assert!(!temp_dir.path().join("escape.txt").exists());
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("all.zip");
        fs::write(&archive_path, b"this is not a zip archive ".repeat(16)).expect("write");

        let result = ZipExtractor.extract(&archive_path, &temp_dir.path().join("out"));
        assert!(
            matches!(result, Err(ExtractionError::Malformed(_))),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn undecodable_entry_data_is_malformed() {
        let err = ExtractionError::from(zip::result::ZipError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "Invalid checksum",
        )));
        assert!(matches!(err, ExtractionError::Malformed(ref message) if message.contains("checksum")));
    }

    #[test]
    fn local_read_failure_stays_io() {
        let err = ExtractionError::from(zip::result::ZipError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert!(matches!(err, ExtractionError::Io(ref source) if source.kind() == io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn extract_empty_archive() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("empty.zip");
        write_zip(&archive_path, &[]);

        let result = ZipExtractor.extract(&archive_path, &temp_dir.path().join("out"));
        assert!(matches!(result, Err(ExtractionError::EmptyArchive)));
    }
}
