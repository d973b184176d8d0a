//! Default configuration values

/// Project configuration file, looked up in the target directory
pub const CONFIG_FILE_NAME: &str = ".geppetto.toml";

/// Directory names the scanner never descends into
pub const DEFAULT_IGNORED_DIRS: &[&str] =
    &["node_modules", ".git", "target", "vendor", ".geppetto"];

/// Buffer size of the worker signal channel
pub const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// Directory (relative to the target) holding content stamps
pub const STAMP_DIR: &str = ".geppetto/stamps";

/// Helm registry used by `helm push` when none is configured
pub const DEFAULT_CHART_REPO: &str = "local";

/// Shell used to run toolchain commands
pub const SHELL: &str = "/bin/bash";

/// Process exit code when the run finished but some units did not succeed
pub const EXIT_UNITS_FAILED: i32 = 2;
