//! Destination resolution for provisioned libraries.
//!
//! Maps each artifact onto one (archive-relative path, destination path)
//! pair per [`PlatformTarget`]. Resolution is a pure function of the artifact
//! name, the destination root, and the library prefix; nothing here touches
//! the filesystem.
//!
//! Archive layout: `<triple>/<triple>/release/<file>`.
//! Destination layout: `<root>/<resource dir>/<file>`.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use super::identifier::ArtifactName;
use super::target::PlatformTarget;

/// The library prefix applied to artifact names by the upstream packaging.
pub const DEFAULT_LIBRARY_PREFIX: &str = "cosmian_";

/// One file to install: where it sits in the archive and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationEntry {
    /// The component this file belongs to.
    pub artifact: ArtifactName,
    /// The platform this build serves.
    pub target: PlatformTarget,
    /// Path of the file relative to the extracted archive root.
    pub archive_path: Utf8PathBuf,
    /// Path the file is installed to.
    pub destination: Utf8PathBuf,
}

/// An ordered, duplicate-free collection of [`DestinationEntry`] values.
///
/// A mapping resolved for one artifact holds exactly one entry per
/// [`PlatformTarget`]. Merged mappings hold the union of their inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DestinationMapping {
    entries: Vec<DestinationEntry>,
}

impl DestinationMapping {
    /// Return the entries in resolution order.
    #[must_use]
    pub fn entries(&self) -> &[DestinationEntry] {
        &self.entries
    }

    /// Iterate over the entries in resolution order.
    pub fn iter(&self) -> std::slice::Iter<'_, DestinationEntry> {
        self.entries.iter()
    }

    /// Return the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into this mapping as a set union.
    ///
    /// Entries are keyed on (archive path, destination). The first
    /// occurrence keeps its position; later duplicates are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use native_provisioner::artefact::identifier::ArtifactName;
    /// use native_provisioner::artefact::mapping::DestinationResolver;
    ///
    /// let resolver = DestinationResolver::new(Utf8PathBuf::from("res"), "cosmian_");
    /// let findex = ArtifactName::try_from("findex").expect("valid");
    /// let mut mapping = resolver.resolve(&findex);
    /// mapping.merge(resolver.resolve(&findex));
    /// assert_eq!(mapping.len(), 3);
    /// ```
    pub fn merge(&mut self, other: Self) {
        for entry in other.entries {
            self.push_unique(entry);
        }
    }

    fn push_unique(&mut self, entry: DestinationEntry) {
        let duplicate = self.entries.iter().any(|existing| {
            existing.archive_path == entry.archive_path && existing.destination == entry.destination
        });
        if !duplicate {
            self.entries.push(entry);
        }
    }
}

impl<'a> IntoIterator for &'a DestinationMapping {
    type Item = &'a DestinationEntry;
    type IntoIter = std::slice::Iter<'a, DestinationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Resolves artifacts to their archive and destination paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationResolver {
    destination_root: Utf8PathBuf,
    library_prefix: String,
}

impl DestinationResolver {
    /// Create a resolver rooted at `destination_root`.
    ///
    /// `library_prefix` is prepended to every artifact name to form the
    /// library stem (`cosmian_` turns `findex` into `libcosmian_findex.so`).
    #[must_use]
    pub fn new(destination_root: Utf8PathBuf, library_prefix: impl Into<String>) -> Self {
        Self {
            destination_root,
            library_prefix: library_prefix.into(),
        }
    }

    /// Return the destination root.
    #[must_use]
    pub fn destination_root(&self) -> &Utf8Path {
        &self.destination_root
    }

    /// Resolve the mapping for a single artifact.
    #[must_use]
    pub fn resolve(&self, artifact: &ArtifactName) -> DestinationMapping {
        let stem = format!("{}{}", self.library_prefix, artifact);
        let entries = PlatformTarget::ALL
            .into_iter()
            .map(|target| {
                let file_name = target.library_file_name(&stem);
                DestinationEntry {
                    artifact: artifact.clone(),
                    target,
                    archive_path: archive_path(target, &file_name),
                    destination: self
                        .destination_root
                        .join(target.resource_dir())
                        .join(&file_name),
                }
            })
            .collect();
        DestinationMapping { entries }
    }

    /// Resolve and merge the mappings for several artifacts.
    #[must_use]
    pub fn resolve_all<'a>(
        &self,
        artifacts: impl IntoIterator<Item = &'a ArtifactName>,
    ) -> DestinationMapping {
        let mut mapping = DestinationMapping::default();
        for artifact in artifacts {
            mapping.merge(self.resolve(artifact));
        }
        mapping
    }
}

fn archive_path(target: PlatformTarget, file_name: &str) -> Utf8PathBuf {
    let triple = target.triple();
    Utf8PathBuf::from(triple)
        .join(triple)
        .join("release")
        .join(file_name)
}
