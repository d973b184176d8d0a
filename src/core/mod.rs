//! Core business logic module
//!
//! This module contains the build orchestration logic for geppetto.
//! It has NO I/O operations - those belong in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`state`] - Per-unit state machine
//! - [`unit`] - Build unit descriptors
//! - [`ledger`] - Build ledger and readiness predicate
//! - [`signal`] - Worker signal protocol
//! - [`worker`] - Worker trait and registry
//! - [`scheduler`] - Scheduling control loop
//! - [`resolver`] - Dependency graph validation
//! - [`config`] - Project configuration (`.geppetto.toml`)
//! - [`version`] - Version bumping

pub mod config;
pub mod ledger;
pub mod resolver;
pub mod scheduler;
pub mod signal;
pub mod state;
pub mod unit;
pub mod version;
pub mod worker;
