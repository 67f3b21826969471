//! Output sinks for buildutil.
//!
//! # Separation of Concerns
//!
//! - **Tracing ([`init`])**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted, not part of the tool's product output.
//!
//! - **[`Logger`]**: The user-facing output of every helper. Always written to
//!   stdout and, when a log file is configured, duplicated there.

use std::cell::RefCell;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=buildutil=debug cargo run -- git-status
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer().with_writer(io::stderr).compact())
        .init();
}

/// Format and write a message through a [`Logger`].
///
/// ```no_run
/// use buildutil::{logf, logging::Logger};
///
/// let log = Logger::stdout();
/// logf!(log, "building {} targets\n", 3);
/// ```
#[macro_export]
macro_rules! logf {
    ($log:expr, $($arg:tt)*) => {
        $log.logf(::std::format_args!($($arg)*))
    };
}

/// Writes helper output to stdout and an optional log file.
///
/// The file is opened in append mode and released when the logger is closed
/// or dropped. Writes are unbuffered, so nothing is lost if the process exits
/// without closing the logger.
#[derive(Debug, Default)]
pub struct Logger {
    sink: Option<LogFile>,
}

#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    file: RefCell<File>,
}

impl Logger {
    /// Logger that writes to stdout only.
    pub fn stdout() -> Self {
        Self::default()
    }

    /// Logger that also appends to `path` when given.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::stdout());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "log file opened");
        Ok(Self {
            sink: Some(LogFile {
                path: path.to_path_buf(),
                file: RefCell::new(file),
            }),
        })
    }

    /// Path of the log file, if one is configured.
    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|sink| sink.path.as_path())
    }

    /// Write formatted text to stdout and the log file.
    ///
    /// Write failures are ignored; logging never fails the caller.
    pub fn logf(&self, args: fmt::Arguments<'_>) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_fmt(args);
        let _ = stdout.flush();
        if let Some(sink) = &self.sink {
            let _ = sink.file.borrow_mut().write_fmt(args);
        }
    }

    /// Flush and release the log file.
    pub fn close(self) -> Result<()> {
        if let Some(sink) = self.sink {
            let mut file = sink.file.into_inner();
            file.flush()
                .with_context(|| format!("flush log file {}", sink.path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_logger_has_no_file() {
        let log = Logger::open(None).expect("open");
        assert!(log.path().is_none());
        logf!(log, "only stdout\n");
        log.close().expect("close");
    }

    #[test]
    fn log_file_receives_duplicated_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("logs").join("build.log");
        let log = Logger::open(Some(&path)).expect("open");
        assert_eq!(log.path(), Some(path.as_path()));

        logf!(log, "step {} of {}\n", 1, 2);
        logf!(log, "plain text\n");
        log.close().expect("close");

        let written = fs::read_to_string(&path).expect("read log");
        assert_eq!(written, "step 1 of 2\nplain text\n");
    }

    #[test]
    fn log_file_is_appended() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("build.log");
        fs::write(&path, "earlier\n").expect("seed log");

        let log = Logger::open(Some(&path)).expect("open");
        logf!(log, "later\n");
        drop(log);

        let written = fs::read_to_string(&path).expect("read log");
        assert_eq!(written, "earlier\nlater\n");
    }
}
