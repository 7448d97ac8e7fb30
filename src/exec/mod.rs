// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the actions compiled into each task, using
//! `tokio::process::Command`:
//!
//! - [`action`] compiles action descriptors into runnable foreground /
//!   background actions (shell script or direct executable).
//! - [`registry`] owns every spawned background child and guarantees
//!   termination at program end.
//! - [`resolve`] locates executables for exec actions, including
//!   platform-specific suffix probing.

pub mod action;
pub mod registry;
pub mod resolve;

pub use action::{Action, compile};
pub use registry::{ProcessId, ProcessRegistry};
