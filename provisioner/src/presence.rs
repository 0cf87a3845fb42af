//! Presence checks for installed libraries.
//!
//! The presence check gates the whole fetch-and-install path: once every
//! destination exists, provisioning is a no-op, which makes it safe to run
//! before every build.

use crate::artefact::mapping::{DestinationEntry, DestinationMapping};

/// Return `true` when every destination in `mapping` exists.
///
/// Stops at the first missing path. Performs no network or archive I/O.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use native_provisioner::artefact::identifier::ArtifactName;
/// use native_provisioner::artefact::mapping::DestinationResolver;
/// use native_provisioner::presence::is_satisfied;
///
/// let resolver = DestinationResolver::new(Utf8PathBuf::from("/nonexistent"), "");
/// let name = ArtifactName::try_from("findex").expect("valid");
/// assert!(!is_satisfied(&resolver.resolve(&name)));
/// ```
#[must_use]
pub fn is_satisfied(mapping: &DestinationMapping) -> bool {
    mapping.iter().all(|entry| entry.destination.exists())
}

/// Return the entries whose destination does not exist, in mapping order.
#[must_use]
pub fn missing_destinations(mapping: &DestinationMapping) -> Vec<&DestinationEntry> {
    mapping
        .iter()
        .filter(|entry| !entry.destination.exists())
        .collect()
}
