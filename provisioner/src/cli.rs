//! CLI argument definitions for the native provisioner.
//!
//! Flags override the matching `provisioner.toml` keys; see
//! [`Cli::apply_to`].

use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

use crate::config::ProvisionerConfig;

/// Download prebuilt native libraries into the project's resource tree.
#[derive(Parser, Debug)]
#[command(name = "native-provisioner")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download prebuilt native libraries into the project's resource tree.\n\n",
    "For every configured collection, the provisioner checks whether the ",
    "library for each platform target is already present. When any is ",
    "missing, it downloads the collection archive, extracts it, and installs ",
    "every target's library. Nothing is fetched when all files are present.\n\n",
    "In continuous integration (CI or GITHUB_ACTIONS set) a failed download is ",
    "retried once with the collection's fallback version.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Provision the collections listed in provisioner.toml:\n",
    "    $ native-provisioner\n\n",
    "  Report missing libraries without downloading anything:\n",
    "    $ native-provisioner --check\n\n",
    "  Install into another resource directory, never falling back:\n",
    "    $ native-provisioner -d resources --no-fallback\n\n",
    "  Emit a machine-readable report:\n",
    "    $ native-provisioner --json --quiet",
))]
pub struct Cli {
    /// Configuration file [default: provisioner.toml when present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Destination root for installed libraries.
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<Utf8PathBuf>,

    /// Scratch directory for the downloaded archive and extraction.
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<Utf8PathBuf>,

    /// Base URL of the artefact host.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Retry failed downloads with the fallback version.
    #[arg(long, conflicts_with = "no_fallback")]
    pub fallback: bool,

    /// Never retry with the fallback version, even in CI.
    #[arg(long)]
    pub no_fallback: bool,

    /// Only report missing libraries; never download.
    #[arg(long)]
    pub check: bool,

    /// Print a JSON report on stdout.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Return the fallback choice made on the command line, if any.
    #[must_use]
    pub const fn fallback_override(&self) -> Option<bool> {
        match (self.fallback, self.no_fallback) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Overwrite configuration values with those given on the command line.
    pub fn apply_to(&self, config: &mut ProvisionerConfig) {
        if let Some(destination) = &self.destination {
            config.destination.clone_from(destination);
        }
        if let Some(scratch_dir) = &self.scratch_dir {
            config.scratch_dir.clone_from(scratch_dir);
        }
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
    }

    /// Return the default log level implied by `-v` and `-q`.
    ///
    /// `RUST_LOG` still takes precedence when set.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbosity) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Warn,
            (false, 1) => LevelFilter::Info,
            (false, 2) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
