//! Launchers for external GUI tools (text editor, diff viewer).

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

use super::config::ToolsConfig;
use super::process::{describe_command, spawn_detached};
use crate::logf;
use crate::logging::Logger;

/// Open `path` in the configured text editor without waiting for it.
pub fn open_notepad_with_file(tools: &ToolsConfig, path: &Path) -> Result<()> {
    let mut cmd = Command::new(&tools.editor);
    cmd.arg(path);
    spawn_detached(cmd)
}

/// Open a side-by-side diff of two files without waiting for it.
pub fn open_code_diff(log: &Logger, tools: &ToolsConfig, path1: &str, path2: &str) -> Result<()> {
    let (path1, path2) = if cfg!(target_os = "macos") {
        (forward_dot_prefix(path1), forward_dot_prefix(path2))
    } else {
        (path1.to_string(), path2.to_string())
    };
    let cmd = diff_command(tools, &path1, &path2)?;
    logf!(log, "running: {}\n", describe_command(&cmd));
    spawn_detached(cmd)
}

fn diff_command(tools: &ToolsConfig, path1: &str, path2: &str) -> Result<Command> {
    let (program, args) = tools
        .diff
        .split_first()
        .context("tools.diff must name a program")?;
    let mut cmd = Command::new(program);
    cmd.args(args).arg(path1).arg(path2);
    Ok(cmd)
}

/// Rewrite Windows-style `.\` relative prefixes to `./`.
fn forward_dot_prefix(path: &str) -> String {
    path.replace(".\\", "./")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_command_appends_paths_to_prefix() {
        let cmd = diff_command(&ToolsConfig::default(), "a.txt", "b.txt").expect("command");
        assert_eq!(
            describe_command(&cmd),
            "code --new-window --diff a.txt b.txt"
        );
    }

    #[test]
    fn diff_command_requires_program() {
        let tools = ToolsConfig {
            diff: Vec::new(),
            ..ToolsConfig::default()
        };
        assert!(diff_command(&tools, "a", "b").is_err());
    }

    #[test]
    fn dot_backslash_prefixes_are_rewritten() {
        assert_eq!(forward_dot_prefix(".\\out\\a.txt"), "./out\\a.txt");
        assert_eq!(forward_dot_prefix("plain.txt"), "plain.txt");
    }

    #[test]
    fn missing_editor_fails_to_start() {
        let tools = ToolsConfig {
            editor: "buildutil-no-such-editor".to_string(),
            ..ToolsConfig::default()
        };
        assert!(open_notepad_with_file(&tools, Path::new("notes.txt")).is_err());
    }
}
