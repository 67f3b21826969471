//! buildutil configuration stored in `buildutil.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "buildutil.toml";

/// buildutil configuration (TOML).
///
/// Every field is optional in the file; missing fields keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildUtilConfig {
    /// Duplicate all helper output into this file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    pub git: GitConfig,

    pub tools: ToolsConfig,
}

/// Expected upstream state for `git-clean`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub branch: String,
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            branch: "master".to_string(),
            remote: "origin".to_string(),
        }
    }
}

/// External GUI tools launched without waiting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Text editor executable, given the file path as its only argument.
    pub editor: String,

    /// Diff command prefix; the two paths are appended.
    pub diff: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            editor: "notepad.exe".to_string(),
            diff: vec![
                "code".to_string(),
                "--new-window".to_string(),
                "--diff".to_string(),
            ],
        }
    }
}

impl BuildUtilConfig {
    pub fn validate(&self) -> Result<()> {
        if self.git.branch.trim().is_empty() {
            return Err(anyhow!("git.branch must be non-empty"));
        }
        if self.git.remote.trim().is_empty() {
            return Err(anyhow!("git.remote must be non-empty"));
        }
        if self.tools.editor.trim().is_empty() {
            return Err(anyhow!("tools.editor must be non-empty"));
        }
        if self.tools.diff.is_empty() || self.tools.diff[0].trim().is_empty() {
            return Err(anyhow!("tools.diff must be a non-empty array"));
        }
        Ok(())
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config toml")
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BuildUtilConfig::default()`.
pub fn load_config(path: &Path) -> Result<BuildUtilConfig> {
    if !path.exists() {
        let cfg = BuildUtilConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BuildUtilConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
