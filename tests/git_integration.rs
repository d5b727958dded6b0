//! Integration tests for the libgit2 commit source.
//!
//! These tests use real git repositories created via tempfile and the
//! git CLI, then read them back through [`Git`].

mod common;

use tempfile::TempDir;

use common::{Upstream, BASE_TIME};
use git2graph::core::types::Oid;
use git2graph::credentials::NoCredentials;
use git2graph::git::{CommitSource, Git, GitError, WalkOrder};

fn oid(hex: &str) -> Oid {
    Oid::new(hex).unwrap()
}

/// Walk every commit from `starts` and return the hashes in walk order.
fn walk_hashes(git: &Git, starts: &[Oid], order: WalkOrder) -> Vec<String> {
    git.walk(starts, order)
        .unwrap()
        .map(|record| record.unwrap().hash.as_str().to_string())
        .collect()
}

// =============================================================================
// Opening
// =============================================================================

#[test]
fn open_clone() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    assert_eq!(git.location(), clone.path().canonicalize().unwrap());
    assert!(git.git_dir().ends_with(".git/"));
    assert_eq!(git.remote_names().unwrap(), vec!["origin".to_string()]);
}

#[test]
fn location_is_canonical() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let clone = upstream.clone_repo();

    let direct = Git::open(clone.path()).unwrap();
    let roundabout = Git::open(&clone.path().join(".").join("..").join("clone")).unwrap();
    assert_eq!(direct.location(), roundabout.location());
    assert!(direct.location().is_absolute());
}

#[test]
fn open_non_repository_fails() {
    let dir = TempDir::new().unwrap();
    let result = Git::open(dir.path());
    assert!(matches!(result, Err(GitError::NotARepo { .. })));
}

// =============================================================================
// Reference tips
// =============================================================================

#[test]
fn reference_tips_skip_symbolic_head() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    let b = upstream.commit("B", 10);
    upstream.branch("feature", &a);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    let tips = git.reference_tips().unwrap();

    let names: Vec<&str> = tips.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["refs/remotes/origin/feature", "refs/remotes/origin/main"]
    );
    assert_eq!(tips[0].target, oid(&a));
    assert_eq!(tips[1].target, oid(&b));
}

#[test]
fn local_branches_are_not_tips() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let clone = upstream.clone_repo();
    common::run_git(clone.path(), &["branch", "local-only"]);

    let git = Git::open(clone.path()).unwrap();
    let tips = git.reference_tips().unwrap();
    assert!(tips.iter().all(|t| t.name.is_remote_ref()));
    assert_eq!(tips.len(), 1);
}

#[test]
fn repository_without_remotes_has_no_tips() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);

    let git = Git::open(upstream.path()).unwrap();
    assert!(git.reference_tips().unwrap().is_empty());
}

// =============================================================================
// Reading commits
// =============================================================================

#[test]
fn commit_record_fields() {
    let upstream = Upstream::new();
    let a = upstream.commit_as("Ada Lovelace", "ada@example.com", "Add \"engine\" notes", 0);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    let record = git.commit(&oid(&a)).unwrap();

    assert_eq!(record.hash, oid(&a));
    assert!(record.is_root());
    assert_eq!(record.author.name, "Ada Lovelace");
    assert_eq!(record.author.email, "ada@example.com");
    assert_eq!(record.committer.email, "test@example.com");
    assert_eq!(record.author_time.epoch_seconds(), BASE_TIME);
    assert_eq!(record.commit_time.epoch_seconds(), BASE_TIME);
    assert_eq!(record.author_time.offset_minutes(), 0);
    // Quotes survive reading; they are only normalized on export.
    assert!(record.message.starts_with("Add \"engine\" notes"));
    assert_eq!(record.transfer_message().trim_end(), "Add 'engine' notes");
}

#[test]
fn merge_parents_keep_order() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    upstream.branch("feature", &a);
    let b = upstream.commit("B", 10);
    upstream.checkout("feature");
    let f = upstream.commit("F", 20);
    upstream.checkout("main");
    let m = upstream.merge("feature", "Merge feature", 30);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    let record = git.commit(&oid(&m)).unwrap();
    assert_eq!(record.parents, vec![oid(&b), oid(&f)]);
    assert_eq!(record.joined_parents(), format!("{b} {f}"));
}

#[test]
fn missing_commit_is_an_error() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let git = Git::open(upstream.path()).unwrap();

    let result = git.commit(&oid(&"1".repeat(40)));
    assert!(result.is_err());
}

// =============================================================================
// Walking
// =============================================================================

#[test]
fn time_walk_is_newest_first() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    let b = upstream.commit("B", 10);
    let c = upstream.commit("C", 20);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    let hashes = walk_hashes(&git, &[oid(&c)], WalkOrder::Time);
    assert_eq!(hashes, vec![c, b, a]);
}

#[test]
fn walk_visits_shared_ancestors_once() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    upstream.branch("feature", &a);
    let b = upstream.commit("B", 10);
    upstream.checkout("feature");
    let f = upstream.commit("F", 20);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    let mut hashes = walk_hashes(&git, &[oid(&b), oid(&f)], WalkOrder::Time);
    assert_eq!(hashes.len(), 3);
    hashes.sort();
    let mut expected = vec![a, b, f];
    expected.sort();
    assert_eq!(hashes, expected);
}

#[test]
fn walk_from_no_starts_is_empty() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let git = Git::open(upstream.path()).unwrap();

    assert!(walk_hashes(&git, &[], WalkOrder::Time).is_empty());
}

#[test]
fn topological_walk_puts_children_first() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    upstream.branch("feature", &a);
    let b = upstream.commit("B", 10);
    upstream.checkout("feature");
    let f = upstream.commit("F", 20);
    upstream.checkout("main");
    let m = upstream.merge("feature", "Merge feature", 30);
    let clone = upstream.clone_repo();

    let git = Git::open(clone.path()).unwrap();
    let hashes = walk_hashes(&git, &[oid(&m)], WalkOrder::Topological);
    let position = |h: &str| hashes.iter().position(|x| x == h).unwrap();

    assert_eq!(hashes.len(), 4);
    assert!(position(&m) < position(&b));
    assert!(position(&m) < position(&f));
    assert!(position(&b) < position(&a));
    assert!(position(&f) < position(&a));
}

#[test]
fn cancelled_walk_yields_nothing_more() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let b = upstream.commit("B", 10);
    let git = Git::open(upstream.path()).unwrap();

    let mut walk = git.walk(&[oid(&b)], WalkOrder::Time).unwrap();
    assert!(walk.next().is_some());
    walk.cancel();
    assert!(walk.next().is_none());
}

// =============================================================================
// Fetching
// =============================================================================

#[test]
fn fetch_picks_up_new_commits() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let clone = upstream.clone_repo();
    let d = upstream.commit("D", 10);

    let git = Git::open(clone.path()).unwrap();
    let remotes = git.fetch_remotes(&NoCredentials).unwrap();
    assert_eq!(remotes, vec!["origin".to_string()]);

    let tips = git.reference_tips().unwrap();
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].target, oid(&d));
}

#[test]
fn fetch_prunes_deleted_branches() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    upstream.branch("feature", &a);
    let clone = upstream.clone_repo();
    upstream.delete_branch("feature");

    let git = Git::open(clone.path()).unwrap();
    assert_eq!(git.reference_tips().unwrap().len(), 2);

    git.fetch_remotes(&NoCredentials).unwrap();
    let tips = git.reference_tips().unwrap();
    let names: Vec<&str> = tips.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["refs/remotes/origin/main"]);
}

#[test]
fn fetch_follows_force_push() {
    let upstream = Upstream::new();
    let a = upstream.commit("A", 0);
    upstream.commit("B", 10);
    let clone = upstream.clone_repo();
    upstream.reset_hard(&a);
    let b2 = upstream.commit("B rewritten", 20);

    let git = Git::open(clone.path()).unwrap();
    git.fetch_remotes(&NoCredentials).unwrap();

    let tips = git.reference_tips().unwrap();
    assert_eq!(tips[0].target, oid(&b2));
    assert_eq!(clone.rev_parse("refs/remotes/origin/main"), b2);
}

#[test]
fn fetch_without_remotes_is_a_no_op() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let git = Git::open(upstream.path()).unwrap();

    assert!(git.fetch_remotes(&NoCredentials).unwrap().is_empty());
}

#[test]
fn fetch_from_missing_remote_fails() {
    let upstream = Upstream::new();
    upstream.commit("A", 0);
    let clone = upstream.clone_repo();
    drop(upstream);

    let git = Git::open(clone.path()).unwrap();
    assert!(git.fetch_remotes(&NoCredentials).is_err());
}
