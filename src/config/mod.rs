// src/config/mod.rs

//! Build description loading for rbuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the normalized description the
//!   graph compiler consumes (`model.rs`).
//! - Load a build file from disk, expanding `[include]` namespaces
//!   (`loader.rs`).
//!
//! Nothing below `config` knows how the build was authored; the graph core
//! only ever sees [`BuildDesc`] / [`TaskDesc`] records.

pub mod loader;
pub mod model;

pub use loader::{BUILD_FILE_NAME, load, resolve_build_file};
pub use model::{ActionDesc, ActionKind, BuildDesc, TaskDesc};
