//! Stable exit codes for buildutil CLI commands.
//!
//! Aborts raised through [`crate::fatal::must`] exit with the panic status (101).

/// Command succeeded.
pub const OK: i32 = 0;
/// `buildutil git-clean` found the repository not clean.
pub const NOT_CLEAN: i32 = 1;
/// `buildutil cmp` found the files different (`2` is clap's usage-error code).
pub const DIFFERENT: i32 = 3;
