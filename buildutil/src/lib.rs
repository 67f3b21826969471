//! Build and release helper utilities.
//!
//! Small, single-purpose wrappers used by release scripts:
//!
//! - **[`io`]**: Side-effecting helpers (filesystem, subprocesses, git, zip archives,
//!   configuration). Every helper returns `anyhow::Result`; none of them terminate
//!   the process.
//! - **[`fatal`]** and **[`exit_codes`]**: The fail-fast policy. Only the top-level
//!   driver decides whether an error aborts the program or becomes an exit status.
//! - **[`logging`]**: The `logf` output sink and development tracing.

pub mod exit_codes;
pub mod fatal;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
