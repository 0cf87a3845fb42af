//! Platform targets served by the artefact host.
//!
//! The set is closed: every collection archive carries exactly one build per
//! target, and every destination mapping holds exactly one entry per target.
//! Library naming is derived from the target at runtime rather than from
//! `#[cfg(target_os)]`, because all three files are installed regardless of
//! the host.

use serde::Serialize;
use std::fmt;

/// One supported (operating system, architecture) pair.
///
/// # Examples
///
/// ```
/// use native_provisioner::artefact::target::PlatformTarget;
///
/// let linux = PlatformTarget::Linux;
/// assert_eq!(linux.triple(), "x86_64-unknown-linux-gnu");
/// assert_eq!(linux.library_file_name("cosmian_findex"), "libcosmian_findex.so");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformTarget {
    /// macOS on x86-64.
    Darwin,
    /// GNU/Linux on x86-64.
    Linux,
    /// Windows on x86-64, built with the GNU toolchain.
    Windows,
}

impl PlatformTarget {
    /// Every supported target, in installation order.
    pub const ALL: [Self; 3] = [Self::Darwin, Self::Linux, Self::Windows];

    /// Return the build triple naming this target's directory in the archive.
    #[must_use]
    pub const fn triple(self) -> &'static str {
        match self {
            Self::Darwin => "x86_64-apple-darwin",
            Self::Linux => "x86_64-unknown-linux-gnu",
            Self::Windows => "x86_64-pc-windows-gnu",
        }
    }

    /// Return the destination subdirectory label for this target.
    ///
    /// These are the resource prefixes a JNA-style loader searches, so they
    /// differ from the build triples.
    #[must_use]
    pub const fn resource_dir(self) -> &'static str {
        match self {
            Self::Darwin => "darwin-x86-64",
            Self::Linux => "linux-x86-64",
            Self::Windows => "win32-x86-64",
        }
    }

    /// Return the shared library extension for this target.
    #[must_use]
    pub const fn library_extension(self) -> &'static str {
        match self {
            Self::Darwin => ".dylib",
            Self::Linux => ".so",
            Self::Windows => ".dll",
        }
    }

    /// Return the library filename prefix for this target.
    ///
    /// On Windows, shared libraries have no `lib` prefix.
    #[must_use]
    pub const fn library_prefix(self) -> &'static str {
        match self {
            Self::Windows => "",
            Self::Darwin | Self::Linux => "lib",
        }
    }

    /// Build the platform-specific file name for a library stem.
    #[must_use]
    pub fn library_file_name(self, stem: &str) -> String {
        format!(
            "{}{stem}{}",
            self.library_prefix(),
            self.library_extension()
        )
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case::darwin(PlatformTarget::Darwin, "libcosmian_findex.dylib", "darwin-x86-64")]
    #[case::linux(PlatformTarget::Linux, "libcosmian_findex.so", "linux-x86-64")]
    #[case::windows(PlatformTarget::Windows, "cosmian_findex.dll", "win32-x86-64")]
    fn library_naming_for_target(
        #[case] target: PlatformTarget,
        #[case] file_name: &str,
        #[case] resource_dir: &str,
    ) {
        assert_eq!(target.library_file_name("cosmian_findex"), file_name);
        assert_eq!(target.resource_dir(), resource_dir);
    }

    #[test]
    fn all_targets_have_distinct_triples_and_directories() {
        let triples: HashSet<_> = PlatformTarget::ALL.iter().map(|t| t.triple()).collect();
        let dirs: HashSet<_> = PlatformTarget::ALL
            .iter()
            .map(|t| t.resource_dir())
            .collect();
        assert_eq!(triples.len(), 3);
        assert_eq!(dirs.len(), 3);
    }

    #[test]
    fn display_shows_resource_dir() {
        assert_eq!(PlatformTarget::Windows.to_string(), "win32-x86-64");
    }
}
