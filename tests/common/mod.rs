//! Shared fixtures for tests that need real repositories.
//!
//! An [`Upstream`] is a plain repository that commits are made in; a
//! [`Downstream`] clone of it carries `refs/remotes/origin/*`, which is what the
//! synchronizer reads. Commit dates are fixed so walk order is stable.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Base timestamp for fixture commits.
pub const BASE_TIME: i64 = 1_700_000_000;

/// A repository commits are made in.
pub struct Upstream {
    dir: TempDir,
}

impl Upstream {
    /// An empty repository whose unborn HEAD is `main`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "--quiet"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commit on the current branch at `BASE_TIME + offset`, returning the hash.
    pub fn commit(&self, message: &str, offset: i64) -> String {
        self.commit_as("Test User", "test@example.com", message, offset)
    }

    /// Commit with an explicit author.
    pub fn commit_as(&self, name: &str, email: &str, message: &str, offset: i64) -> String {
        let date = format!("@{} +0000", BASE_TIME + offset);
        let author = format!("{name} <{email}>");
        run_git_with_env(
            self.path(),
            &[
                "commit",
                "--quiet",
                "--allow-empty",
                "--author",
                &author,
                "-m",
                message,
            ],
            &[("GIT_AUTHOR_DATE", &date), ("GIT_COMMITTER_DATE", &date)],
        );
        self.rev_parse("HEAD")
    }

    /// Merge `branch` into the current branch with a merge commit.
    pub fn merge(&self, branch: &str, message: &str, offset: i64) -> String {
        let date = format!("@{} +0000", BASE_TIME + offset);
        run_git_with_env(
            self.path(),
            &["merge", "--quiet", "--no-ff", "-m", message, branch],
            &[("GIT_AUTHOR_DATE", &date), ("GIT_COMMITTER_DATE", &date)],
        );
        self.rev_parse("HEAD")
    }

    pub fn branch(&self, name: &str, at: &str) {
        run_git(self.path(), &["branch", name, at]);
    }

    pub fn checkout(&self, name: &str) {
        run_git(self.path(), &["checkout", "--quiet", name]);
    }

    pub fn delete_branch(&self, name: &str) {
        run_git(self.path(), &["branch", "--quiet", "-D", name]);
    }

    /// Move the current branch to `target`, discarding commits above it.
    pub fn reset_hard(&self, target: &str) {
        run_git(self.path(), &["reset", "--quiet", "--hard", target]);
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        rev_parse(self.path(), rev)
    }

    /// Clone this repository into a fresh directory.
    pub fn clone_repo(&self) -> Downstream {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("clone");
        let upstream = self.path().to_string_lossy().into_owned();
        let target = path.to_string_lossy().into_owned();
        run_git(dir.path(), &["clone", "--quiet", &upstream, &target]);
        Downstream { _dir: dir, path }
    }
}

/// A clone of an [`Upstream`].
pub struct Downstream {
    _dir: TempDir,
    path: PathBuf,
}

impl Downstream {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        rev_parse(self.path(), rev)
    }
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
    run_git_with_env(dir, args, &[]);
}

/// Run a git command with extra environment variables.
pub fn run_git_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) {
    let output = Command::new("git")
        .args(args)
        .envs(env.iter().copied())
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = Command::new("git")
        .args(["rev-parse", rev])
        .current_dir(dir)
        .output()
        .expect("git rev-parse failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}
