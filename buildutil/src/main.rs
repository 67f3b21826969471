//! Build and release helper CLI.
//!
//! Each subcommand wraps one helper from the `buildutil` library. Any helper
//! error aborts the program; `git-clean` and `cmp` report their verdict
//! through the exit status instead.

use std::path::{Path, PathBuf};
use std::process::{self, Command as ProcessCommand};

use anyhow::{Result, bail};
use buildutil::exit_codes;
use buildutil::fatal::must;
use buildutil::io::archive::{
    create_zip_file, extract_zip_file, is_dir_entry, read_zip_file,
};
use buildutil::io::config::{BuildUtilConfig, DEFAULT_CONFIG_PATH, load_config};
use buildutil::io::fs::{are_files_equal, ls, recreate_dir, remove_file};
use buildutil::io::git::{Git, GitCleanliness};
use buildutil::io::process::{OutputMode, run_cmd};
use buildutil::io::tools::{open_code_diff, open_notepad_with_file};
use buildutil::logf;
use buildutil::logging::{self, Logger};
use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser)]
#[command(name = "buildutil", version, about = "Build and release helper utilities")]
struct Cli {
    /// TOML config file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Also append all output to this file (overrides `log_file` in the config).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete a directory tree and create it again, empty.
    RecreateDir { dir: PathBuf },
    /// Delete a file (a missing file is not an error).
    Rm { path: PathBuf },
    /// Print the size of each path.
    Ls {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Compare two files byte-for-byte.
    Cmp { path1: PathBuf, path2: PathBuf },
    /// Run a command, aborting if it fails.
    Run {
        /// Working directory for the command.
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Pass output straight through instead of capturing it.
        #[arg(long)]
        inherit: bool,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Open a file in the configured text editor.
    Notepad { path: PathBuf },
    /// Open two files in the configured diff tool.
    Diff { path1: String, path2: String },
    /// Run `git pull`.
    GitPull {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Run `git status`.
    GitStatus {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Require a clean checkout that is up to date with its upstream.
    GitClean {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Create a zip archive from files and directories under a base directory.
    Zip {
        dst: PathBuf,
        /// Directory the names are relative to.
        #[arg(long, default_value = ".")]
        base: PathBuf,
        #[arg(required = true)]
        names: Vec<PathBuf>,
    },
    /// List the entries of a zip archive with their sizes.
    UnzipList { archive: PathBuf },
    /// Extract every file of a zip archive into a directory.
    Unzip { archive: PathBuf, dest: PathBuf },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = must(run(cli));
    process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli.config)?;
    let log_file = cli.log_file.or_else(|| config.log_file.clone());
    let log = Logger::open(log_file.as_deref())?;
    if let Some(path) = log.path() {
        debug!(path = %path.display(), "duplicating output to log file");
    }
    let code = dispatch(&log, &config, cli.command)?;
    log.close()?;
    debug!(code, "command finished");
    Ok(code)
}

fn dispatch(log: &Logger, config: &BuildUtilConfig, command: Command) -> Result<i32> {
    match command {
        Command::RecreateDir { dir } => {
            recreate_dir(&dir)?;
            Ok(exit_codes::OK)
        }
        Command::Rm { path } => {
            remove_file(log, &path);
            Ok(exit_codes::OK)
        }
        Command::Ls { paths } => {
            for path in paths {
                ls(log, &path)?;
            }
            Ok(exit_codes::OK)
        }
        Command::Cmp { path1, path2 } => cmd_cmp(log, &path1, &path2),
        Command::Run {
            dir,
            inherit,
            command,
        } => cmd_run(log, dir, inherit, &command),
        Command::Notepad { path } => {
            open_notepad_with_file(&config.tools, &path)?;
            Ok(exit_codes::OK)
        }
        Command::Diff { path1, path2 } => {
            open_code_diff(log, &config.tools, &path1, &path2)?;
            Ok(exit_codes::OK)
        }
        Command::GitPull { dir } => {
            Git::new(dir, &config.git).pull(log)?;
            Ok(exit_codes::OK)
        }
        Command::GitStatus { dir } => {
            Git::new(dir, &config.git).status(log)?;
            Ok(exit_codes::OK)
        }
        Command::GitClean { dir } => cmd_git_clean(log, Git::new(dir, &config.git)),
        Command::Zip { dst, base, names } => {
            create_zip_file(log, &dst, &base, &names)?;
            Ok(exit_codes::OK)
        }
        Command::UnzipList { archive } => {
            let contents = read_zip_file(&archive)?;
            for (name, data) in contents.iter().filter(|(name, _)| !is_dir_entry(name)) {
                logf!(log, "{name} {}\n", data.len());
            }
            Ok(exit_codes::OK)
        }
        Command::Unzip { archive, dest } => {
            let written = extract_zip_file(log, &archive, &dest)?;
            logf!(log, "extracted {written} files to {}\n", dest.display());
            Ok(exit_codes::OK)
        }
        Command::Config => {
            logf!(log, "{}", config.to_toml()?);
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_cmp(log: &Logger, path1: &Path, path2: &Path) -> Result<i32> {
    if are_files_equal(path1, path2)? {
        logf!(log, "equal\n");
        Ok(exit_codes::OK)
    } else {
        logf!(log, "different\n");
        Ok(exit_codes::DIFFERENT)
    }
}

fn cmd_run(log: &Logger, dir: Option<PathBuf>, inherit: bool, command: &[String]) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        bail!("no command given");
    };
    let mut cmd = ProcessCommand::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let mode = if inherit {
        OutputMode::Inherit
    } else {
        OutputMode::Capture
    };
    run_cmd(log, cmd, mode)?;
    Ok(exit_codes::OK)
}

fn cmd_git_clean(log: &Logger, git: Git) -> Result<i32> {
    match git.check_clean(log)? {
        GitCleanliness::Clean => Ok(exit_codes::OK),
        GitCleanliness::Dirty { missing, status } => {
            logf!(log, "{}", git.dirty_report(&missing, &status));
            Ok(exit_codes::NOT_CLEAN)
        }
    }
}
