//! BDD tests for the provisioning workflow.
#![expect(
    clippy::expect_used,
    reason = "tests abort on fixture setup failures"
)]

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use native_provisioner::artefact::extraction::ZipExtractor;
use native_provisioner::artefact::identifier::{ArtifactName, CollectionName, VersionIdentifier};
use native_provisioner::artefact::mapping::{DestinationMapping, DestinationResolver};
use native_provisioner::artefact::target::PlatformTarget;
use native_provisioner::provision::{
    ProvisionOutcome, ProvisionPolicy, ProvisionReport, ProvisionRequest, Provisioner,
};
use native_provisioner::scratch::ScratchArea;
use native_provisioner::test_utils::{StubFetcher, collection_archive, collection_archive_for};

const PREFIX: &str = "cosmian_";
const FALLBACK: &str = "last_build";

#[derive(Default)]
struct ProvisionWorld {
    _temp_dir: Option<tempfile::TempDir>,
    root: Option<Utf8PathBuf>,
    fetcher: StubFetcher,
    allow_fallback: bool,
    report: Option<ProvisionReport>,
}

impl ProvisionWorld {
    fn root(&self) -> &Utf8PathBuf {
        self.root.as_ref().expect("root set")
    }

    fn resolver(&self) -> DestinationResolver {
        DestinationResolver::new(self.root().join("resources"), PREFIX)
    }

    fn scratch(&self) -> ScratchArea {
        ScratchArea::new(self.root().join("scratch"))
    }

    fn findex_mapping(&self) -> DestinationMapping {
        self.resolver()
            .resolve(&ArtifactName::try_from("findex").expect("valid artifact"))
    }

    fn serve(&mut self, version: &str, archive: Vec<u8>) {
        let fetcher = std::mem::take(&mut self.fetcher);
        self.fetcher = fetcher.serving(version, archive);
    }

    fn report(&self) -> &ProvisionReport {
        self.report.as_ref().expect("report set")
    }
}

#[fixture]
fn world() -> ProvisionWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    ProvisionWorld {
        _temp_dir: Some(temp_dir),
        root: Some(root),
        ..Default::default()
    }
}

fn target_by_dir(resource_dir: &str) -> PlatformTarget {
    PlatformTarget::ALL
        .into_iter()
        .find(|target| target.resource_dir() == resource_dir)
        .expect("known resource directory")
}

#[given("the findex libraries are already installed")]
fn given_already_installed(world: &mut ProvisionWorld) {
    for entry in &world.findex_mapping() {
        std::fs::create_dir_all(entry.destination.parent().expect("parent")).expect("create dir");
        std::fs::write(&entry.destination, b"installed earlier").expect("write library");
    }
}

#[given("the host serves \"{version}\" with every target")]
fn given_host_serves(world: &mut ProvisionWorld, version: String) {
    world.serve(&version, collection_archive(PREFIX, &["findex"]));
}

#[given("the host serves \"{version}\" without the \"{resource_dir}\" build")]
fn given_host_serves_without(world: &mut ProvisionWorld, version: String, resource_dir: String) {
    let excluded = target_by_dir(&resource_dir);
    let targets: Vec<_> = PlatformTarget::ALL
        .into_iter()
        .filter(|target| *target != excluded)
        .collect();
    world.serve(&version, collection_archive_for(PREFIX, &["findex"], &targets));
}

#[given("fallback is allowed")]
fn given_fallback_allowed(world: &mut ProvisionWorld) {
    world.allow_fallback = true;
}

#[given("fallback is not allowed")]
fn given_fallback_not_allowed(world: &mut ProvisionWorld) {
    world.allow_fallback = false;
}

#[given("an earlier run left scratch files behind")]
fn given_scratch_leftovers(world: &mut ProvisionWorld) {
    let scratch = world.scratch();
    std::fs::create_dir_all(scratch.extract_dir().join("stale")).expect("create stale dir");
    std::fs::write(scratch.archive_path(), b"truncated download").expect("write stale archive");
}

#[when("findex \"{version}\" is provisioned")]
fn when_provisioned(world: &mut ProvisionWorld, version: String) {
    let request = ProvisionRequest {
        collection: CollectionName::try_from("findex").expect("valid collection"),
        components: vec![ArtifactName::try_from("findex").expect("valid artifact")],
        primary: VersionIdentifier::try_from(version).expect("valid version"),
        fallback: Some(VersionIdentifier::try_from(FALLBACK).expect("valid version")),
    };
    let policy = ProvisionPolicy {
        allow_fallback: world.allow_fallback,
        fallback_on_install_failure: false,
    };

    let mut stderr = Vec::new();
    let report = Provisioner::new(&world.fetcher, &ZipExtractor, world.resolver(), world.scratch())
        .with_policy(policy)
        .quiet(true)
        .provision(&request, &mut stderr);
    world.report = Some(report);
}

#[then("the outcome is satisfied without installing")]
fn then_satisfied_without_installing(world: &mut ProvisionWorld) {
    assert_eq!(
        world.report().outcome,
        ProvisionOutcome::Satisfied { installed: None }
    );
}

#[then("the outcome is satisfied with \"{version}\"")]
fn then_satisfied_with(world: &mut ProvisionWorld, version: String) {
    let outcome = &world.report().outcome;
    match outcome {
        ProvisionOutcome::Satisfied {
            installed: Some(installed),
        } => assert_eq!(installed.as_str(), version),
        other => panic!("expected installation of {version}, got {other:?}"),
    }
}

#[then("the outcome is a failure mentioning \"{text}\"")]
fn then_failure_mentioning(world: &mut ProvisionWorld, text: String) {
    match &world.report().outcome {
        ProvisionOutcome::Failed { reason } => assert!(
            reason.contains(&text),
            "expected reason to contain '{text}', got: {reason}"
        ),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[then("no download was attempted")]
fn then_no_download(world: &mut ProvisionWorld) {
    assert!(world.fetcher.attempts().is_empty());
    assert!(world.report().attempts.is_empty());
}

#[then("the host was asked for \"{versions}\"")]
fn then_host_asked_for(world: &mut ProvisionWorld, versions: String) {
    let expected: Vec<&str> = versions.split(", ").collect();
    assert_eq!(world.fetcher.requested_versions(), expected);
}

#[then("every findex library is installed")]
fn then_every_library_installed(world: &mut ProvisionWorld) {
    for entry in &world.findex_mapping() {
        assert!(entry.destination.is_file(), "{} missing", entry.destination);
    }
}

#[then("no findex library is installed")]
fn then_no_library_installed(world: &mut ProvisionWorld) {
    for entry in &world.findex_mapping() {
        assert!(!entry.destination.exists(), "{} unexpectedly present", entry.destination);
    }
}

#[then("the scratch area is clean")]
fn then_scratch_clean(world: &mut ProvisionWorld) {
    assert!(world.scratch().is_clean());
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Libraries already present skip the download"
)]
fn scenario_already_present(world: ProvisionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Missing libraries are installed from the primary version"
)]
fn scenario_primary_install(world: ProvisionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Failed primary download falls back in continuous integration"
)]
fn scenario_fallback(world: ProvisionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Failed primary download fails without fallback"
)]
fn scenario_no_fallback(world: ProvisionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Archive missing a target leaves destinations untouched"
)]
fn scenario_missing_target(world: ProvisionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Leftovers from a crashed run are cleared"
)]
fn scenario_leftovers(world: ProvisionWorld) {
    let _ = world;
}
