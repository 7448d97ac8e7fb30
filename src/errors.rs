// src/errors.rs

//! Crate-wide error types.
//!
//! The structured variants cover the compile-time taxonomy (bad references,
//! duplicate tasks, cycles); runtime paths mostly flow through `anyhow` and
//! land in the transparent `Other` variant.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RbuildError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// One or more dependency/watch names did not resolve to a task. Every
    /// offending reference has already been logged individually.
    #[error("unresolved task references: {0}")]
    UnresolvedReferences(String),

    #[error("duplicate task '{0}'")]
    DuplicateTask(String),

    #[error("cycle detected in task graph involving '{0}'")]
    Cycle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RbuildError>;
