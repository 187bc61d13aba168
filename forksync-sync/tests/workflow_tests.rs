//! End-to-end workflow tests over the recording fake collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use assert_fs::prelude::*;
use forksync_core::{paths, Config, OrgName, RepoName, SourceTarget};
use forksync_sync::{
    fake::{FakeHosting, FakeVcs, RecordingSleeper, ALWAYS},
    run, HostingClient, SyncError,
};
use predicates::prelude::predicate;
use rstest::rstest;

fn config_in(home: &assert_fs::TempDir, sources: Vec<SourceTarget>) -> Config {
    let mut config = Config::defaults_at(home.path());
    config.work_dir = home.path().join("work");
    config.build_org = "build".into();
    config.sources = sources;
    config
}

fn not_interrupted() -> AtomicBool {
    AtomicBool::new(false)
}

/// `<work>/<repo>/.git`, as a previous run's clone would leave it.
fn existing_checkout(home: &assert_fs::TempDir, repo: &str) -> PathBuf {
    let dir = home.path().join("work").join(repo);
    std::fs::create_dir_all(dir.join(".git")).expect("mkdir");
    dir
}

// ---------------------------------------------------------------------------
// 1. Failure isolation and quarantine
// ---------------------------------------------------------------------------

#[test]
fn failed_clone_is_quarantined_and_batch_continues() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let hosting = FakeHosting::new()
        .with_repos("A", &["r1", "r2"])
        .fail_clone("A", "r1", ALWAYS);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");

    assert!(!report.is_success());
    let org = &report.orgs[0];
    assert_eq!((org.processed, org.failed, org.skipped), (1, 1, 0));
    assert_eq!(org.failures[0].repo, RepoName::from("r1"));
    assert_eq!(hosting.count_calls("clone A/r1"), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );

    home.child("work/r1/.forksync-skip")
        .assert(predicate::path::is_file());
    home.child("work/r2/.forksync-skip")
        .assert(predicate::path::missing());
}

#[test]
fn rerun_never_reaches_pipeline_for_quarantined_repo() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    paths::write_skip_marker(&config, &RepoName::from("r1")).expect("marker");

    let hosting = FakeHosting::new().with_repos("A", &["r1", "r2"]);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    for _ in 0..2 {
        let report =
            run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
        let org = &report.orgs[0];
        assert_eq!((org.processed, org.failed, org.skipped), (1, 0, 1));
        assert!(report.is_success());
    }

    assert_eq!(hosting.count_calls("clone A/r1"), 0);
    assert_eq!(hosting.count_calls("view build/r1"), 0);
    assert!(vcs.pushes().iter().all(|p| !p.dir.ends_with("r1")));
    // r2 was cloned once, then fetched on the rerun
    assert_eq!(hosting.count_calls("clone A/r2"), 1);
    assert_eq!(vcs.count_calls("fetch"), 1);
}

#[test]
fn push_failure_after_retries_quarantines_repo() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let dir = existing_checkout(&home, "r1");

    let hosting = FakeHosting::new()
        .with_repos("A", &["r1"])
        .with_existing("build", "r1");
    let vcs = FakeVcs::new().with_branch(&dir, "TEST").fail("push", ALWAYS);
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
    assert_eq!(report.orgs[0].failed, 1);
    assert!(report.orgs[0].failures[0].error.contains("after 3 attempt(s)"));
    assert_eq!(vcs.count_calls("push build TEST:BUILD"), 3);
    home.child("work/r1/.forksync-skip")
        .assert(predicate::path::is_file());
}

#[test]
fn clearing_marker_after_failed_clone_clones_again() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let hosting = FakeHosting::new()
        .with_repos("A", &["r1"])
        .fail_clone("A", "r1", 3);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
    assert_eq!(report.orgs[0].failed, 1);
    home.child("work/r1").assert(predicate::path::is_dir());

    std::fs::remove_file(paths::skip_marker_path(&config, &RepoName::from("r1")))
        .expect("clear marker");

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("rerun");
    assert!(report.is_success());
    assert_eq!(report.orgs[0].processed, 1);
    assert_eq!(hosting.count_calls("clone A/r1"), 4);
    assert_eq!(vcs.count_calls("fetch"), 0);
    home.child("work/r1/.git").assert(predicate::path::is_dir());
}

#[test]
fn fork_failure_after_retries_quarantines_without_pushing() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let hosting = FakeHosting::new()
        .with_repos("A", &["r1"])
        .fail_fork("A", "r1", ALWAYS);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
    let org = &report.orgs[0];
    assert_eq!((org.processed, org.failed), (0, 1));
    assert!(org.failures[0].error.contains("fork A/r1 into build"));
    assert_eq!(hosting.count_calls("fork A/r1"), 3);
    assert_eq!(vcs.count_calls("push build"), 0);
    assert_eq!(vcs.count_calls("remote"), 0);
    home.child("work/r1/.forksync-skip")
        .assert(predicate::path::is_file());
}

#[test]
fn fetch_failure_on_existing_checkout_quarantines_repo() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    existing_checkout(&home, "r1");

    let hosting = FakeHosting::new().with_repos("A", &["r1", "r2"]);
    let vcs = FakeVcs::new().fail("fetch", 1);
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
    let org = &report.orgs[0];
    assert_eq!((org.processed, org.failed), (1, 1));
    assert_eq!(org.failures[0].repo, RepoName::from("r1"));
    assert_eq!(vcs.count_calls("fetch"), 1);
    assert_eq!(hosting.count_calls("clone A/r1"), 0);
    assert!(sleeper.delays().is_empty());
    home.child("work/r1/.forksync-skip")
        .assert(predicate::path::is_file());
}

// ---------------------------------------------------------------------------
// 2. Organization-level failures
// ---------------------------------------------------------------------------

#[rstest]
#[case::erroring(FakeHosting::new().with_listing_error("A", "HTTP 404"))]
#[case::empty(FakeHosting::new().with_repos("A", &[]))]
fn bad_listing_fails_org_and_run_continues(#[case] hosting: FakeHosting) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(
        &home,
        vec![SourceTarget::new("A", "TEST"), SourceTarget::new("B", "DEV")],
    );
    let hosting = hosting.with_repos("B", &["r9"]);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");

    assert_eq!(report.orgs.len(), 2);
    assert!(report.orgs[0].listing_error.is_some());
    assert!(!report.orgs[0].is_success());
    assert!(report.orgs[1].is_success());
    assert_eq!(report.orgs[1].processed, 1);
    assert!(!report.is_success());
}

// ---------------------------------------------------------------------------
// 3. Preconditions
// ---------------------------------------------------------------------------

#[test]
fn unauthenticated_session_touches_nothing() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let hosting = FakeHosting::new().unauthenticated().with_repos("A", &["r1"]);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let err = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).unwrap_err();
    assert!(matches!(err, SyncError::NotAuthenticated(_)));
    assert_eq!(hosting.calls(), ["auth"]);
    assert!(vcs.calls().is_empty());
}

// ---------------------------------------------------------------------------
// 4. Dry run and destination ref
// ---------------------------------------------------------------------------

#[test]
fn dry_run_makes_no_mutating_calls() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut config = config_in(
        &home,
        vec![SourceTarget::new("A", "TEST"), SourceTarget::new("B", "DEV")],
    );
    config.dry_run = true;
    let hosting = FakeHosting::new()
        .with_repos("A", &["r1", "r2"])
        .with_repos("B", &["r3"]);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");

    assert!(report.dry_run);
    assert!(report.is_success());
    assert_eq!(report.orgs[0].processed, 2);
    assert_eq!(report.orgs[1].processed, 1);
    assert_eq!(hosting.calls(), ["auth", "list A 1000", "list B 1000"]);
    assert!(vcs.calls().is_empty());
    home.child("work/r1").assert(predicate::path::missing());
}

#[test]
fn both_source_branches_land_on_the_same_destination_ref() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(
        &home,
        vec![SourceTarget::new("A", "TEST"), SourceTarget::new("B", "DEV")],
    );
    let hosting = FakeHosting::new()
        .with_repos("A", &["shared"])
        .with_repos("B", &["shared"]);
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
    assert!(report.is_success());

    // Repositories are laid out by name only, so B's "shared" reuses A's clone:
    // B/shared is never cloned, and DEV is fetched and reconciled against A's origin.
    assert_eq!(hosting.count_calls("clone A/shared"), 1);
    assert_eq!(hosting.count_calls("clone B/shared"), 0);
    assert_eq!(vcs.count_calls("fetch"), 1);

    let build_pushes: Vec<_> = vcs
        .pushes()
        .into_iter()
        .filter(|p| p.remote == "build")
        .collect();
    assert_eq!(build_pushes.len(), 2);
    assert_eq!(build_pushes[0].branch.as_str(), "TEST");
    assert_eq!(build_pushes[1].branch.as_str(), "DEV");
    assert!(build_pushes.iter().all(|p| p.dest.as_str() == "BUILD"));
    assert!(build_pushes.iter().all(|p| p.dir == build_pushes[0].dir));
    // the fork created for A is reused for B
    assert_eq!(hosting.count_calls("fork"), 1);
}

// ---------------------------------------------------------------------------
// 5. Soft degradation
// ---------------------------------------------------------------------------

#[test]
fn failed_pull_still_pushes_local_tip() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let dir = existing_checkout(&home, "r1");

    let hosting = FakeHosting::new().with_repos("A", &["r1"]);
    let vcs = FakeVcs::new().with_branch(&dir, "TEST").fail("pull", ALWAYS);
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &not_interrupted()).expect("run");
    assert!(report.is_success());
    assert_eq!(report.orgs[0].processed, 1);
    assert_eq!(vcs.count_calls("push build TEST:BUILD"), 1);
    home.child("work/r1/.forksync-skip")
        .assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 6. Interrupts
// ---------------------------------------------------------------------------

/// Delegates to [`FakeHosting`], raising the interrupt flag inside `clone_repo`
/// the way a Ctrl-C during a long clone would.
struct InterruptDuringClone<'a> {
    inner: FakeHosting,
    flag: &'a AtomicBool,
}

impl HostingClient for InterruptDuringClone<'_> {
    fn auth_status(&self) -> Result<(), SyncError> {
        self.inner.auth_status()
    }

    fn list_repos(&self, org: &OrgName, limit: u32) -> Result<Vec<RepoName>, SyncError> {
        self.inner.list_repos(org, limit)
    }

    fn clone_repo(&self, org: &OrgName, repo: &RepoName, dest: &Path) -> Result<(), SyncError> {
        self.flag.store(true, Ordering::SeqCst);
        self.inner.clone_repo(org, repo, dest)
    }

    fn repo_exists(&self, org: &OrgName, repo: &RepoName) -> Result<bool, SyncError> {
        self.inner.repo_exists(org, repo)
    }

    fn fork_repo(&self, org: &OrgName, repo: &RepoName, into: &OrgName) -> Result<(), SyncError> {
        self.inner.fork_repo(org, repo, into)
    }
}

#[test]
fn interrupt_during_last_repository_is_reported() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config = config_in(&home, vec![SourceTarget::new("A", "TEST")]);
    let interrupt = not_interrupted();
    let hosting = InterruptDuringClone {
        inner: FakeHosting::new().with_repos("A", &["r1"]),
        flag: &interrupt,
    };
    let vcs = FakeVcs::new();
    let sleeper = RecordingSleeper::default();

    let report = run::run(&config, &hosting, &vcs, &sleeper, &interrupt).expect("run");

    assert_eq!(report.orgs[0].processed, 1);
    assert!(report.interrupted);
    assert!(!report.is_success());
    home.child("work/r1/.forksync-skip")
        .assert(predicate::path::missing());
}
