//! I/O helpers for build scripts.

pub mod archive;
pub mod config;
pub mod fs;
pub mod git;
pub mod process;
pub mod tools;
