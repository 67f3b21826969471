//! Test-only helpers for building fixture files and git repositories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// A throwaway git repository on `master` with one commit.
///
/// The working tree lives in `work/`; [`TestRepo::with_origin`] adds a bare
/// `origin.git/` next to it.
pub struct TestRepo {
    dir: TempDir,
    work: PathBuf,
}

impl TestRepo {
    /// Repository with no upstream.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("tempdir")?;
        let work = dir.path().join("work");
        fs::create_dir_all(&work).with_context(|| format!("create {}", work.display()))?;
        let repo = Self { dir, work };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "buildutil tests"])?;
        repo.git(&["config", "user.email", "buildutil@local.invalid"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        write_file(repo.path(), "README.md", b"fixture\n")?;
        repo.git(&["add", "-A"])?;
        repo.git(&["commit", "--quiet", "-m", "chore: fixture"])?;
        repo.git(&["branch", "-M", "master"])?;
        Ok(repo)
    }

    /// Repository whose `master` tracks `origin/master` in a local bare repo.
    pub fn with_origin() -> Result<Self> {
        let repo = Self::new()?;
        let origin = repo.dir.path().join("origin.git");
        let output = Command::new("git")
            .args(["init", "--quiet", "--bare"])
            .arg(&origin)
            .output()
            .context("spawn git init --bare")?;
        if !output.status.success() {
            bail!(
                "git init --bare failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let origin = origin.to_str().context("origin path is not utf-8")?;
        repo.git(&["remote", "add", "origin", origin])?;
        repo.git(&["push", "--quiet", "-u", "origin", "master"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.work
    }

    /// Run git in the repository and return stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
