//! Archive installation into the destination tree.
//!
//! Installation is all-or-nothing with respect to the mapping:
//!
//! 1. the scratch area is cleared of leftovers and the archive bytes are
//!    written to the temporary archive file;
//! 2. the archive is extracted into the scratch extraction directory;
//! 3. every mapping entry is located in the extracted tree before any
//!    destination is touched;
//! 4. each file is staged into a temporary file beside its destination;
//! 5. only once every file is staged are they renamed into place.
//!
//! A missing entry or a staging failure therefore leaves all destinations as
//! they were. The scratch area is cleared on every exit path.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io;
use tempfile::NamedTempFile;

use crate::artefact::extraction::{ArchiveExtractor, ExtractionError};
use crate::artefact::mapping::{DestinationEntry, DestinationMapping};
use crate::artefact::target::PlatformTarget;
use crate::scratch::ScratchArea;

/// Errors arising from archive installation.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The scratch area could not be prepared or written.
    #[error("scratch area {path} is unusable: {source}")]
    Scratch {
        /// The scratch path that failed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The downloaded bytes could not be extracted.
    #[error("corrupt archive: {0}")]
    Corrupt(#[source] ExtractionError),

    /// The archive lacks the build for one platform target.
    #[error("archive has no {target} build at {path}; the upstream packaging may have changed")]
    MissingEntry {
        /// The expected archive-relative path.
        path: Utf8PathBuf,
        /// The target the missing file serves.
        target: PlatformTarget,
    },

    /// A destination could not be written.
    #[error("failed to install {path}: {source}")]
    Filesystem {
        /// The destination (or source) path that failed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    /// Whether the failure concerns the archive contents rather than the
    /// local machine.
    ///
    /// Only archive-content failures may be retried with another version.
    #[must_use]
    pub const fn is_archive_fault(&self) -> bool {
        matches!(self, Self::Corrupt(_) | Self::MissingEntry { .. })
    }
}

/// Installs collection archives using a fixed scratch area.
pub struct ArchiveInstaller<'a> {
    extractor: &'a dyn ArchiveExtractor,
    scratch: &'a ScratchArea,
}

impl<'a> ArchiveInstaller<'a> {
    /// Create an installer using `extractor` and `scratch`.
    #[must_use]
    pub const fn new(extractor: &'a dyn ArchiveExtractor, scratch: &'a ScratchArea) -> Self {
        Self { extractor, scratch }
    }

    /// Install every entry of `mapping` from `archive`.
    ///
    /// Existing destination files are overwritten. Returns the installed
    /// destination paths in mapping order.
    ///
    /// # Errors
    ///
    /// Returns an [`InstallError`] describing the first failing stage. No
    /// destination is modified unless every entry could be staged.
    pub fn install(
        &self,
        archive: &[u8],
        mapping: &DestinationMapping,
    ) -> Result<Vec<Utf8PathBuf>, InstallError> {
        let guard = self
            .scratch
            .prepare()
            .map_err(|source| scratch_error(self.scratch.root(), source))?;
        let area = guard.area();

        let archive_path = area.archive_path();
        fs::write(&archive_path, archive).map_err(|source| scratch_error(&archive_path, source))?;
        debug!("wrote {} archive bytes to {archive_path}", archive.len());

        let extract_dir = area.extract_dir();
        self.extractor
            .extract(archive_path.as_std_path(), extract_dir.as_std_path())
            .map_err(|err| match err {
                ExtractionError::Io(source) => scratch_error(&extract_dir, source),
                other => InstallError::Corrupt(other),
            })?;

        let sources = locate_sources(&extract_dir, mapping)?;
        let staged = sources
            .into_iter()
            .map(|(source, entry)| stage(&source, entry))
            .collect::<Result<Vec<_>, _>>()?;
        commit(staged)
    }
}

/// Pair every mapping entry with its extracted file, failing on the first
/// entry the archive does not contain.
fn locate_sources<'m>(
    extract_dir: &Utf8Path,
    mapping: &'m DestinationMapping,
) -> Result<Vec<(Utf8PathBuf, &'m DestinationEntry)>, InstallError> {
    mapping
        .iter()
        .map(|entry| {
            let source = extract_dir.join(&entry.archive_path);
            if source.is_file() {
                Ok((source, entry))
            } else {
                Err(InstallError::MissingEntry {
                    path: entry.archive_path.clone(),
                    target: entry.target,
                })
            }
        })
        .collect()
}

/// A copy of one library waiting to be renamed over its destination.
struct StagedFile<'m> {
    file: NamedTempFile,
    destination: &'m Utf8Path,
}

fn stage<'m>(source: &Utf8Path, entry: &'m DestinationEntry) -> Result<StagedFile<'m>, InstallError> {
    let destination = entry.destination.as_path();
    let parent = match destination.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| filesystem_error(parent, e))?;

    let mut file = tempfile::Builder::new()
        .prefix(".provision-")
        .tempfile_in(parent)
        .map_err(|e| filesystem_error(destination, e))?;
    let mut input = fs::File::open(source).map_err(|e| filesystem_error(source, e))?;
    io::copy(&mut input, file.as_file_mut()).map_err(|e| filesystem_error(destination, e))?;

    let permissions = input
        .metadata()
        .map_err(|e| filesystem_error(source, e))?
        .permissions();
    fs::set_permissions(file.path(), permissions)
        .map_err(|e| filesystem_error(destination, e))?;

    Ok(StagedFile { file, destination })
}

/// Rename every staged file into place.
///
/// Staged files not yet renamed when a rename fails are deleted on drop.
fn commit(staged: Vec<StagedFile<'_>>) -> Result<Vec<Utf8PathBuf>, InstallError> {
    let mut installed = Vec::with_capacity(staged.len());
    for StagedFile { file, destination } in staged {
        if let Err(e) = file.persist(destination) {
            if !installed.is_empty() {
                warn!(
                    "rename into {destination} failed after {} files were installed",
                    installed.len()
                );
            }
            return Err(filesystem_error(destination, e.error));
        }
        debug!("installed {destination}");
        installed.push(destination.to_owned());
    }
    Ok(installed)
}

fn scratch_error(path: &Utf8Path, source: io::Error) -> InstallError {
    InstallError::Scratch {
        path: path.to_owned(),
        source,
    }
}

fn filesystem_error(path: &Utf8Path, source: io::Error) -> InstallError {
    InstallError::Filesystem {
        path: path.to_owned(),
        source,
    }
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
