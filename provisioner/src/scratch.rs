//! Scratch area lifecycle for downloads and extraction.
//!
//! The scratch area lives at a fixed location so that leftovers from a
//! crashed run can be found and removed before the next one starts. It holds
//! the downloaded archive and the extraction directory. [`ScratchGuard`]
//! removes both when dropped, on success and failure alike.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io;

/// Default scratch root, relative to the working directory.
pub const DEFAULT_SCRATCH_DIR: &str = ".native-provisioner";

const ARCHIVE_NAME: &str = "all.zip";
const EXTRACT_DIR_NAME: &str = "tmp";

/// Fixed locations for the temporary archive and extraction directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchArea {
    root: Utf8PathBuf,
}

impl ScratchArea {
    /// Create a scratch area rooted at `root`.
    #[must_use]
    pub const fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// Return the scratch root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Return the path of the temporary archive file.
    #[must_use]
    pub fn archive_path(&self) -> Utf8PathBuf {
        self.root.join(ARCHIVE_NAME)
    }

    /// Return the path of the extraction directory.
    #[must_use]
    pub fn extract_dir(&self) -> Utf8PathBuf {
        self.root.join(EXTRACT_DIR_NAME)
    }

    /// Whether neither the temporary archive nor the extraction directory
    /// exists.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.archive_path().exists() && !self.extract_dir().exists()
    }

    /// Remove leftovers from an earlier run and create an empty extraction
    /// directory.
    ///
    /// The returned guard clears the area again when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if leftovers cannot be removed or the extraction
    /// directory cannot be created. Any partial state is cleared before the
    /// error is returned.
    pub fn prepare(&self) -> io::Result<ScratchGuard<'_>> {
        let guard = ScratchGuard { area: self };
        self.clear()?;
        fs::create_dir_all(self.extract_dir())?;
        Ok(guard)
    }

    /// Remove the temporary archive and extraction directory, if present.
    ///
    /// # Errors
    ///
    /// Returns the first removal error other than "not found".
    pub fn clear(&self) -> io::Result<()> {
        let extract_dir = self.extract_dir();
        if extract_dir.exists() {
            debug!("removing scratch directory {extract_dir}");
            fs::remove_dir_all(&extract_dir)?;
        }
        match fs::remove_file(self.archive_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Clear the area and remove its root when empty.
    ///
    /// Failures are logged, never returned.
    pub fn discard(&self) {
        if let Err(e) = self.clear() {
            warn!("failed to clean scratch area {}: {e}", self.root);
        }
        // Only succeeds when the root is empty, which leaves shared or
        // pre-populated directories alone.
        if fs::remove_dir(&self.root).is_err() {
            debug!("scratch root {} left in place", self.root);
        }
    }
}

/// Clears a [`ScratchArea`] when dropped.
///
/// Removal failures are logged rather than returned so they never mask the
/// result of the stage that used the scratch area.
#[derive(Debug)]
pub struct ScratchGuard<'a> {
    area: &'a ScratchArea,
}

impl ScratchGuard<'_> {
    /// Return the guarded scratch area.
    #[must_use]
    pub const fn area(&self) -> &ScratchArea {
        self.area
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.area.discard();
    }
}
