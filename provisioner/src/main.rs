//! Native provisioner CLI entrypoint.
//!
//! Loads the configuration, resolves the fallback policy from the command
//! line, the file, and the CI environment, then provisions every configured
//! collection. `--check` only reports missing files.

use clap::Parser;
use std::io::Write;

use native_provisioner::artefact::download::HttpFetcher;
use native_provisioner::artefact::extraction::ZipExtractor;
use native_provisioner::artefact::mapping::DestinationMapping;
use native_provisioner::cli::Cli;
use native_provisioner::config::{ProvisionerConfig, fallback_from_env};
use native_provisioner::error::{ProvisionerError, Result};
use native_provisioner::output::{
    json_report, missing_report, summary_message, write_stderr_line,
};
use native_provisioner::presence::missing_destinations;
use native_provisioner::provision::Provisioner;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let mut config = ProvisionerConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    if cli.check {
        return run_check(cli, &config, stdout, stderr);
    }

    let policy = config.policy(cli.fallback_override(), fallback_from_env);
    log::debug!("fallback policy: {policy:?}");

    let fetcher = HttpFetcher::new(config.base_url.clone(), config.timeout());
    let provisioner = Provisioner::new(&fetcher, &ZipExtractor, config.resolver(), config.scratch())
        .with_policy(policy)
        .quiet(cli.quiet);
    let reports = provisioner.provision_all(&config.requests(), stderr);

    if cli.json {
        writeln!(stdout, "{}", json_report(&reports)?)?;
    }

    let failed = reports
        .iter()
        .filter(|report| !report.outcome.is_satisfied())
        .count();
    if !cli.quiet {
        write_stderr_line(
            stderr,
            summary_message(reports.len(), failed, &config.destination),
        );
    }
    if failed > 0 {
        return Err(ProvisionerError::Unsatisfied {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

/// Reports missing destinations without touching the network.
fn run_check(
    cli: &Cli,
    config: &ProvisionerConfig,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let resolver = config.resolver();
    let mut mapping = DestinationMapping::default();
    for request in config.requests() {
        mapping.merge(request.mapping(&resolver));
    }
    let missing = missing_destinations(&mapping);

    if cli.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&missing)?)?;
    }
    if !cli.quiet || !missing.is_empty() {
        for line in missing_report(&missing) {
            write_stderr_line(stderr, line);
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProvisionerError::Missing {
            count: missing.len(),
        })
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    result.map_or_else(
        |err| {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        },
        |()| 0,
    )
}
