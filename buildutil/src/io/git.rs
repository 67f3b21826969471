//! Git adapter for build scripts.
//!
//! Release builds must start from a pushed, clean checkout, so we keep a
//! small wrapper around `git` subprocess calls that prints everything it runs.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use tracing::{debug, instrument, warn};

use super::config::GitConfig;
use super::process::{OutputMode, run_cmd};
use crate::logging::Logger;

/// Result of comparing `git status` against the expected clean state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCleanliness {
    Clean,
    Dirty {
        /// First expected line that `git status` did not print.
        missing: String,
        /// Full `git status` output.
        status: String,
    },
}

/// Wrapper for executing git commands, optionally in a specific directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: Option<PathBuf>,
    branch: String,
    remote: String,
}

impl Git {
    /// `workdir` of `None` runs git in the current directory.
    pub fn new(workdir: Option<PathBuf>, config: &GitConfig) -> Self {
        Self {
            workdir,
            branch: config.branch.clone(),
            remote: config.remote.clone(),
        }
    }

    /// Run `git pull`.
    #[instrument(skip_all)]
    pub fn pull(&self, log: &Logger) -> Result<()> {
        run_cmd(log, self.command(&["pull"]), OutputMode::Capture)?;
        Ok(())
    }

    /// Run `git status` and return its output.
    pub fn status(&self, log: &Logger) -> Result<String> {
        run_cmd(log, self.command(&["status"]), OutputMode::Capture)
    }

    /// Lines `git status` prints for an up-to-date checkout with nothing to commit.
    pub fn clean_markers(&self) -> [String; 3] {
        [
            format!("On branch {}", self.branch),
            format!(
                "Your branch is up to date with '{}/{}'.",
                self.remote, self.branch
            ),
            "nothing to commit, working tree clean".to_string(),
        ]
    }

    /// Check that the checkout is on the expected branch, in sync with its
    /// upstream, and has nothing to commit.
    #[instrument(skip_all)]
    pub fn check_clean(&self, log: &Logger) -> Result<GitCleanliness> {
        let status = self.status(log)?;
        let markers = self.clean_markers();
        match first_missing_marker(&status, &markers) {
            None => {
                debug!("worktree is clean");
                Ok(GitCleanliness::Clean)
            }
            Some(missing) => {
                warn!(missing, "worktree not clean");
                Ok(GitCleanliness::Dirty {
                    missing: missing.to_string(),
                    status,
                })
            }
        }
    }

    /// Human-readable explanation of a failed clean check.
    pub fn dirty_report(&self, missing: &str, status: &str) -> String {
        let dir = self
            .workdir
            .as_deref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        format!(
            "Git repo in '{dir}' not clean.\nDidn't find '{missing}' in output of git status:\n{status}\n"
        )
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Return the first of `markers` that does not occur in `status`.
pub fn first_missing_marker<'a>(status: &str, markers: &'a [String]) -> Option<&'a str> {
    markers
        .iter()
        .map(String::as_str)
        .find(|marker| !status.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_STATUS: &str = "On branch master\n\
        Your branch is up to date with 'origin/master'.\n\
        \n\
        nothing to commit, working tree clean\n";

    fn default_git() -> Git {
        Git::new(None, &GitConfig::default())
    }

    #[test]
    fn default_markers_match_git_wording() {
        let markers = default_git().clean_markers();
        assert_eq!(markers[0], "On branch master");
        assert_eq!(markers[1], "Your branch is up to date with 'origin/master'.");
        assert_eq!(markers[2], "nothing to commit, working tree clean");
    }

    #[test]
    fn clean_status_has_no_missing_marker() {
        let markers = default_git().clean_markers();
        assert_eq!(first_missing_marker(CLEAN_STATUS, &markers), None);
    }

    #[test]
    fn wrong_branch_is_reported_first() {
        let status = CLEAN_STATUS.replace("master", "feature");
        let markers = default_git().clean_markers();
        assert_eq!(
            first_missing_marker(&status, &markers),
            Some("On branch master")
        );
    }

    #[test]
    fn ahead_of_upstream_is_dirty() {
        let status = "On branch master\n\
            Your branch is ahead of 'origin/master' by 1 commit.\n\
            \n\
            nothing to commit, working tree clean\n";
        let markers = default_git().clean_markers();
        assert_eq!(
            first_missing_marker(status, &markers),
            Some("Your branch is up to date with 'origin/master'.")
        );
    }

    #[test]
    fn uncommitted_changes_are_dirty() {
        let status = "On branch master\n\
            Your branch is up to date with 'origin/master'.\n\
            \n\
            Changes not staged for commit:\n\
            \tmodified:   build.rs\n";
        let markers = default_git().clean_markers();
        assert_eq!(
            first_missing_marker(status, &markers),
            Some("nothing to commit, working tree clean")
        );
    }

    #[test]
    fn markers_follow_configured_branch_and_remote() {
        let config = GitConfig {
            branch: "main".to_string(),
            remote: "upstream".to_string(),
        };
        let markers = Git::new(None, &config).clean_markers();
        assert_eq!(markers[0], "On branch main");
        assert_eq!(markers[1], "Your branch is up to date with 'upstream/main'.");
    }

    #[test]
    fn dirty_report_names_dir_and_marker() {
        let git = Git::new(Some(PathBuf::from("repo")), &GitConfig::default());
        let report = git.dirty_report("On branch master", "On branch dev\n");
        assert!(report.starts_with("Git repo in 'repo' not clean.\n"));
        assert!(report.contains("Didn't find 'On branch master'"));
        assert!(report.contains("On branch dev"));
    }
}
