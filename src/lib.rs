//! Geppetto - dependency-aware builder for NPM, Helm and Go monorepos
//!
//! Geppetto discovers the buildable units in a repository, then builds them
//! concurrently while respecting their dependencies: a unit starts only once
//! everything it depends on has been built or skipped, and a failure blocks
//! every unit downstream of it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (no I/O operations)
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`workers`] - Per-toolchain worker implementations
//! - [`scanner`] - Unit discovery
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
pub mod scanner;
pub mod workers;
