//! Output formatting for the provisioner CLI.
//!
//! Progress and diagnostics are plain lines on stderr. The machine-readable
//! report (`--json`) is the only thing ever written to stdout.

use camino::Utf8Path;
use serde::Serialize;
use std::fmt;
use std::io::Write;

use crate::artefact::mapping::DestinationEntry;
use crate::provision::ProvisionReport;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; nothing useful to do on failure.
    }
}

/// Summarise a provisioning run in one line.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use native_provisioner::output::summary_message;
///
/// let line = summary_message(2, 0, Utf8Path::new("src/main/resources"));
/// assert_eq!(line, "All 2 collections provisioned in src/main/resources");
/// ```
#[must_use]
pub fn summary_message(total: usize, failed: usize, destination_root: &Utf8Path) -> String {
    let noun = if total == 1 { "collection" } else { "collections" };
    if failed == 0 {
        format!("All {total} {noun} provisioned in {destination_root}")
    } else {
        format!("{failed} of {total} {noun} could not be provisioned")
    }
}

/// Describe the destinations a `--check` run found missing.
///
/// Returns one line per missing file, preceded by a heading, or a single
/// confirmation line when nothing is missing.
#[must_use]
pub fn missing_report(missing: &[&DestinationEntry]) -> Vec<String> {
    if missing.is_empty() {
        return vec!["All native libraries are present.".to_owned()];
    }
    let mut lines = Vec::with_capacity(missing.len() + 1);
    lines.push(format!("{} native libraries are missing:", missing.len()));
    lines.extend(missing.iter().map(|entry| {
        format!(
            "  - {} ({}, {}): {}",
            entry.artifact, entry.target, entry.archive_path, entry.destination
        )
    }));
    lines
}

#[derive(Serialize)]
struct JsonReport<'a> {
    satisfied: bool,
    collections: &'a [ProvisionReport],
}

/// Render provisioning reports as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn json_report(reports: &[ProvisionReport]) -> serde_json::Result<String> {
    let report = JsonReport {
        satisfied: reports.iter().all(|report| report.outcome.is_satisfied()),
        collections: reports,
    };
    serde_json::to_string_pretty(&report)
}
