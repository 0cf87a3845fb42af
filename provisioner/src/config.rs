//! Provisioner configuration.
//!
//! Settings live in `provisioner.toml`, deserialised with `serde` and
//! `toml`. Every key is optional; omitted keys take the built-in defaults,
//! which provision the `findex` and `cover_crypt` collections into
//! `src/main/resources`.
//!
//! ```toml
//! destination = "src/main/resources"
//! allow_fallback = true
//!
//! [[collection]]
//! name = "findex"
//! version = "v2.0.0"
//! ```
//!
//! Whether the fallback version may be attempted is resolved once, here,
//! from the command line, the file, and finally the environment. The
//! orchestrator only ever sees the resolved [`ProvisionPolicy`].

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::io;
use std::time::Duration;

use crate::artefact::download::DEFAULT_BASE_URL;
use crate::artefact::identifier::{ArtifactName, CollectionName, VersionIdentifier};
use crate::artefact::mapping::{DEFAULT_LIBRARY_PREFIX, DestinationResolver};
use crate::error::{ProvisionerError, Result};
use crate::provision::{DEFAULT_FALLBACK_VERSION, ProvisionPolicy, ProvisionRequest};
use crate::scratch::{DEFAULT_SCRATCH_DIR, ScratchArea};

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "provisioner.toml";

/// The default destination root, as laid out by Maven-style projects.
pub const DEFAULT_DESTINATION: &str = "src/main/resources";

/// Environment variables whose presence marks a continuous-integration run.
pub const CI_ENV_VARS: [&str; 2] = ["CI", "GITHUB_ACTIONS"];

/// Top-level provisioner configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionerConfig {
    /// Artefact host base URL.
    pub base_url: String,
    /// Root directory receiving the per-target subdirectories.
    pub destination: Utf8PathBuf,
    /// Root of the scratch area used for downloads and extraction.
    pub scratch_dir: Utf8PathBuf,
    /// Prefix joined to artifact names to form library stems.
    pub library_prefix: String,
    /// Whether the fallback version may be attempted. When omitted, the
    /// environment decides.
    pub allow_fallback: Option<bool>,
    /// Whether a corrupt archive or missing entry may trigger the fallback.
    pub fallback_on_install_failure: bool,
    /// Global timeout for one archive request, in seconds.
    pub timeout_secs: Option<u64>,
    /// Collections to provision.
    #[serde(rename = "collection")]
    pub collections: Vec<CollectionConfig>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            destination: Utf8PathBuf::from(DEFAULT_DESTINATION),
            scratch_dir: Utf8PathBuf::from(DEFAULT_SCRATCH_DIR),
            library_prefix: DEFAULT_LIBRARY_PREFIX.to_owned(),
            allow_fallback: None,
            fallback_on_install_failure: false,
            timeout_secs: None,
            collections: default_collections(),
        }
    }
}

/// One `[[collection]]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// The collection (archive group) name.
    pub name: CollectionName,
    /// The primary version.
    pub version: VersionIdentifier,
    /// The fallback version. `fallback = false` disables it for this
    /// collection and `fallback = true` selects the default label.
    #[serde(default = "default_fallback", deserialize_with = "deserialize_fallback")]
    pub fallback: Option<VersionIdentifier>,
    /// Components installed from the collection archive. Defaults to the
    /// collection name alone.
    #[serde(default)]
    pub components: Vec<ArtifactName>,
}

impl CollectionConfig {
    /// Convert this table into a provisioning request.
    #[must_use]
    pub fn to_request(&self) -> ProvisionRequest {
        let components = if self.components.is_empty() {
            vec![ArtifactName::from(&self.name)]
        } else {
            self.components.clone()
        };
        ProvisionRequest {
            collection: self.name.clone(),
            components,
            primary: self.version.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

fn default_fallback() -> Option<VersionIdentifier> {
    VersionIdentifier::try_from(DEFAULT_FALLBACK_VERSION).ok()
}

/// The accepted spellings of a collection's `fallback` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum FallbackSetting {
    Enabled(bool),
    Version(VersionIdentifier),
}

fn deserialize_fallback<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<VersionIdentifier>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match FallbackSetting::deserialize(deserializer)? {
        FallbackSetting::Enabled(true) => default_fallback(),
        FallbackSetting::Enabled(false) => None,
        FallbackSetting::Version(version) => Some(version),
    })
}

fn default_collections() -> Vec<CollectionConfig> {
    [("findex", "v2.0.0"), ("cover_crypt", "v8.0.2")]
        .into_iter()
        .filter_map(|(name, version)| {
            Some(CollectionConfig {
                name: CollectionName::try_from(name).ok()?,
                version: VersionIdentifier::try_from(version).ok()?,
                fallback: default_fallback(),
                components: Vec::new(),
            })
        })
        .collect()
}

impl ProvisionerConfig {
    /// Load the configuration.
    ///
    /// With `explicit` set, that file must exist. Otherwise
    /// [`DEFAULT_CONFIG_FILE`] is read from the working directory when
    /// present, and the built-in defaults apply when it is not.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed, or when it
    /// names no collections.
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self> {
        explicit.map_or_else(
            || Self::read(Utf8Path::new(DEFAULT_CONFIG_FILE), false),
            |path| Self::read(path, true),
        )
    }

    fn read(path: &Utf8Path, required: bool) -> Result<Self> {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                debug!("{path} not found; using built-in configuration");
                return Ok(Self::default());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProvisionerError::ConfigNotFound {
                    path: path.to_owned(),
                });
            }
            Err(source) => {
                return Err(ProvisionerError::ConfigRead {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        let config = Self::from_toml(&source).map_err(|err| ProvisionerError::ConfigParse {
            path: path.to_owned(),
            source: Box::new(err),
        })?;
        config.validate()?;
        debug!("loaded configuration from {path}");
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns the parser's error for malformed TOML, unknown keys, or
    /// invalid identifiers.
    pub fn from_toml(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Check that the configuration names at least one collection.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::NoCollections`] when the list is empty.
    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(ProvisionerError::NoCollections);
        }
        Ok(())
    }

    /// Build one request per configured collection.
    #[must_use]
    pub fn requests(&self) -> Vec<ProvisionRequest> {
        self.collections.iter().map(CollectionConfig::to_request).collect()
    }

    /// Build the destination resolver.
    #[must_use]
    pub fn resolver(&self) -> DestinationResolver {
        DestinationResolver::new(self.destination.clone(), self.library_prefix.clone())
    }

    /// Build the scratch area.
    #[must_use]
    pub fn scratch(&self) -> ScratchArea {
        ScratchArea::new(self.scratch_dir.clone())
    }

    /// Return the request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the fallback policy.
    ///
    /// `cli_override` wins, then the file's `allow_fallback`, then
    /// `env_default`, which is only evaluated when needed.
    #[must_use]
    pub fn policy(
        &self,
        cli_override: Option<bool>,
        env_default: impl FnOnce() -> bool,
    ) -> ProvisionPolicy {
        ProvisionPolicy {
            allow_fallback: cli_override
                .or(self.allow_fallback)
                .unwrap_or_else(env_default),
            fallback_on_install_failure: self.fallback_on_install_failure,
        }
    }
}

/// Whether the process environment marks a continuous-integration run.
#[must_use]
pub fn fallback_from_env() -> bool {
    fallback_from_env_with(|key| std::env::var(key).ok())
}

/// Whether any of [`CI_ENV_VARS`] holds a truthy value, using `lookup` to
/// read variables.
///
/// Empty values, `0`, and `false` (in any case) are not truthy.
#[must_use]
pub fn fallback_from_env_with(lookup: impl Fn(&str) -> Option<String>) -> bool {
    CI_ENV_VARS
        .into_iter()
        .filter_map(lookup)
        .any(|value| is_truthy(&value))
}

fn is_truthy(raw: &str) -> bool {
    let value = raw.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
