//! Filesystem helpers.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::logf;
use crate::logging::Logger;

/// Delete `dir` (if present) and create it again, empty.
///
/// Removal errors are ignored; only a failure to create the directory is reported.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => debug!(dir = %dir.display(), "removed directory"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => debug!(dir = %dir.display(), err = %err, "ignoring remove failure"),
    }
    create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))
}

#[cfg(unix)]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

/// Print `path` and its size in bytes.
pub fn ls(log: &Logger, path: &Path) -> Result<u64> {
    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    logf!(log, "{} {}\n", path.display(), meta.len());
    Ok(meta.len())
}

/// Delete a file.
///
/// A missing file counts as success. Any other failure is printed as a
/// warning and otherwise ignored.
pub fn remove_file(log: &Logger, path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => logf!(log, "removeFile('{}')\n", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "nothing to remove");
        }
        Err(err) => {
            warn!(path = %path.display(), err = %err, "remove failed");
            logf!(log, "remove_file('{}') failed with '{}'\n", path.display(), err);
        }
    }
}

/// Compare two files byte-for-byte.
pub fn are_files_equal(path1: &Path, path2: &Path) -> Result<bool> {
    let d1 = fs::read(path1).with_context(|| format!("read {}", path1.display()))?;
    let d2 = fs::read(path2).with_context(|| format!("read {}", path2.display()))?;
    Ok(d1 == d2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;

    #[test]
    fn recreate_dir_empties_populated_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("out");
        write_file(&dir, "a.txt", b"a").expect("write a");
        write_file(&dir, "nested/b.txt", b"b").expect("write b");

        recreate_dir(&dir).expect("recreate");

        assert!(dir.is_dir());
        let entries = fs::read_dir(&dir).expect("read dir").count();
        assert_eq!(entries, 0);
    }

    #[test]
    fn recreate_dir_creates_missing_parents() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("x").join("y");
        recreate_dir(&dir).expect("recreate");
        assert!(dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn recreate_dir_uses_standard_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("perm");
        recreate_dir(&dir).expect("recreate");
        let mode = fs::metadata(&dir).expect("stat").permissions().mode();
        // umask may only clear bits
        assert_eq!(mode & !0o755 & 0o777, 0);
    }

    #[test]
    fn remove_file_missing_is_silent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log_path = temp.path().join("build.log");
        let log = Logger::open(Some(&log_path)).expect("logger");

        remove_file(&log, &temp.path().join("missing.zip"));
        log.close().expect("close");

        assert_eq!(fs::read_to_string(&log_path).expect("read log"), "");
    }

    #[test]
    fn remove_file_deletes_and_logs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = write_file(temp.path(), "old.zip", b"zip").expect("write");
        let log_path = temp.path().join("build.log");
        let log = Logger::open(Some(&log_path)).expect("logger");

        remove_file(&log, &target);
        log.close().expect("close");

        assert!(!target.exists());
        let logged = fs::read_to_string(&log_path).expect("read log");
        assert!(logged.contains("removeFile("), "unexpected log: {logged}");
    }

    #[test]
    fn remove_file_on_directory_only_warns() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("keep");
        fs::create_dir(&dir).expect("mkdir");

        remove_file(&Logger::stdout(), &dir);
        assert!(dir.is_dir());
    }

    #[test]
    fn identical_files_are_equal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let a = write_file(temp.path(), "a.bin", b"\x00\x01payload").expect("write a");
        let b = write_file(temp.path(), "b.bin", b"\x00\x01payload").expect("write b");
        assert!(are_files_equal(&a, &b).expect("compare"));
    }

    #[test]
    fn single_byte_difference_is_not_equal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let a = write_file(temp.path(), "a.bin", b"payload").expect("write a");
        let b = write_file(temp.path(), "b.bin", b"paylaod").expect("write b");
        let c = write_file(temp.path(), "c.bin", b"payload!").expect("write c");
        assert!(!are_files_equal(&a, &b).expect("compare a b"));
        assert!(!are_files_equal(&a, &c).expect("compare a c"));
    }

    #[test]
    fn compare_missing_file_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let a = write_file(temp.path(), "a.bin", b"payload").expect("write a");
        let err = are_files_equal(&a, &temp.path().join("nope")).expect_err("missing");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn ls_reports_size() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_file(temp.path(), "five.txt", b"12345").expect("write");
        assert_eq!(ls(&Logger::stdout(), &path).expect("ls"), 5);
        assert!(ls(&Logger::stdout(), &temp.path().join("missing")).is_err());
    }
}
