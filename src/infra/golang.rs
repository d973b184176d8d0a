//! Go toolchain service
//!
//! `go.mod` parsing plus the go commands the Go worker runs.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::core::unit::Unit;
use crate::error::{BuildError, FilesystemError};
use crate::infra::commander::CommandRunner;
use crate::infra::filesystem;

/// Manifest file name
pub const MANIFEST: &str = "go.mod";

/// Entry point that makes a module buildable
pub const MAIN_FILE: &str = "main.go";

/// Module path and required modules from `go.mod`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    pub requires: Vec<String>,
}

/// Parse the contents of a `go.mod` file
///
/// Handles both the single-line `require path version` form and
/// parenthesised require blocks.
pub fn parse_go_mod(content: &str) -> Option<GoMod> {
    let module_re = Regex::new(r"^module\s+(\S+)").ok()?;
    let require_re = Regex::new(r"^(?:require\s+)?(\S+)\s+v\S+").ok()?;

    let mut module = None;
    let mut requires = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(caps) = require_re.captures(line) {
                requires.push(caps[1].to_string());
            }
            continue;
        }

        if let Some(caps) = module_re.captures(line) {
            module = Some(caps[1].trim_matches('"').to_string());
        } else if line.starts_with("require") {
            if line.ends_with('(') {
                in_block = true;
            } else if let Some(caps) = require_re.captures(line) {
                requires.push(caps[1].to_string());
            }
        }
    }

    module.map(|module| GoMod { module, requires })
}

/// Read `go.mod` from a module directory
pub fn read_go_mod(dir: &Path) -> Result<GoMod, BuildError> {
    let path = dir.join(MANIFEST);
    let content = filesystem::read_file(&path)?;
    parse_go_mod(&content).ok_or_else(|| {
        BuildError::Filesystem(FilesystemError::Parse {
            path,
            format: "go.mod",
            error: "missing module directive".to_string(),
        })
    })
}

/// go commands for one module directory at a time
#[derive(Clone)]
pub struct GoService {
    runner: Arc<dyn CommandRunner>,
}

impl GoService {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run(
        &self,
        unit: &Unit,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<(), BuildError> {
        self.runner.run(&unit.path, command, cancel).await?;
        Ok(())
    }

    pub async fn tidy(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "go mod tidy", cancel).await
    }

    /// Download module dependencies
    pub async fn install(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "go mod download", cancel).await
    }

    pub async fn test(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "go test ./...", cancel).await
    }

    /// Modules with a `main.go` produce a binary
    pub fn buildable(&self, unit: &Unit) -> bool {
        unit.path.join(MAIN_FILE).exists()
    }

    /// Build a static linux/amd64 binary into `build/`
    pub async fn build(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        let command = format!(
            "CGO_ENABLED=0 GOOS=linux GOARCH=amd64 go build -o build/{}",
            binary_name(&unit.name)
        );
        self.run(unit, &command, cancel).await
    }
}

/// Last path segment of a module path
pub fn binary_name(module: &str) -> &str {
    module.rsplit('/').next().unwrap_or(module)
}
