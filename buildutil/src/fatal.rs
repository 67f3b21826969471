//! Fail-fast helper for the top-level driver.

use std::fmt::Display;

/// Unwrap `result`, or print the error and abort.
///
/// This is an unrecoverable abort (panic), not an error return. Library code
/// propagates `Result`s; callers that want the "any error kills the build"
/// behavior wrap the outermost call in `must`.
#[track_caller]
pub fn must<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            println!("err: {err:#}");
            panic!("{err:#}");
        }
    }
}
