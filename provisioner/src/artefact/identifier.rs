//! Validated identifiers for artifacts, collections, and versions.
//!
//! All three are substituted verbatim into URL path segments and file names,
//! so they share one rule: non-empty, no path separators, no whitespace, and
//! never `.` or `..`. Versions are otherwise opaque; no ordering or semantic
//! version parsing is performed.

use super::error::{ArtefactError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Check that `value` can stand alone as a single path segment.
fn validate_segment(kind: &'static str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value == "." || value == ".." {
        Some("must not be a relative path component")
    } else if value.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if value.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else {
        None
    };

    reason.map_or(Ok(()), |reason| {
        Err(ArtefactError::InvalidIdentifier {
            kind,
            value: value.to_owned(),
            reason,
        })
    })
}

macro_rules! segment_newtype {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ArtefactError;

            fn try_from(value: &str) -> Result<Self> {
                validate_segment($kind, value)?;
                Ok(Self(value.to_owned()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = ArtefactError;

            fn try_from(value: String) -> Result<Self> {
                validate_segment($kind, &value)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

segment_newtype!(
    /// The logical name of one native component, such as `findex`.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_provisioner::artefact::identifier::ArtifactName;
    ///
    /// let name = ArtifactName::try_from("findex").expect("valid name");
    /// assert_eq!(name.as_str(), "findex");
    /// assert!(ArtifactName::try_from("../etc").is_err());
    /// ```
    ArtifactName,
    "artifact name"
);

segment_newtype!(
    /// The name of an archive group on the artefact host.
    ///
    /// One collection is served as a single `all.zip` and may contain
    /// several components.
    CollectionName,
    "collection name"
);

segment_newtype!(
    /// An exact build identifier: a release tag such as `v2.0.0` or a
    /// build label such as `last_build`.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_provisioner::artefact::identifier::VersionIdentifier;
    ///
    /// let version = VersionIdentifier::try_from("last_build").expect("valid label");
    /// assert_eq!(version.to_string(), "last_build");
    /// ```
    VersionIdentifier,
    "version identifier"
);

impl From<&CollectionName> for ArtifactName {
    /// A collection without listed components holds one artifact of the same
    /// name.
    fn from(name: &CollectionName) -> Self {
        Self(name.0.clone())
    }
}
