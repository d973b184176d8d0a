//! Configuration and constants
//!
//! - [`defaults`] - Built-in default values

pub mod defaults;
