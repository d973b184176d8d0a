//! NPM toolchain service
//!
//! `package.json` parsing plus the npm commands the NPM worker runs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::core::unit::Unit;
use crate::core::version;
use crate::error::{BuildError, CommandError};
use crate::infra::commander::CommandRunner;
use crate::infra::filesystem;

/// Manifest file name
pub const MANIFEST: &str = "package.json";

/// The parts of `package.json` geppetto cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageJson {
    /// Packages with a build script are applications
    pub fn is_application(&self) -> bool {
        self.scripts.contains_key("build")
    }

    /// Names from `dependencies` and `devDependencies`
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .cloned()
            .collect()
    }
}

/// Read `package.json` from a package directory
pub fn read_package(dir: &Path) -> Result<PackageJson, BuildError> {
    Ok(filesystem::read_json(&dir.join(MANIFEST))?)
}

/// npm commands for one package directory at a time
#[derive(Clone)]
pub struct NpmService {
    runner: Arc<dyn CommandRunner>,
}

impl NpmService {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run(
        &self,
        unit: &Unit,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<String, BuildError> {
        Ok(self.runner.run(&unit.path, command, cancel).await?)
    }

    pub async fn install(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "npm install", cancel).await.map(drop)
    }

    pub async fn lint(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "npm run lint --silent", cancel).await.map(drop)
    }

    pub async fn test(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "npm test --silent", cancel).await.map(drop)
    }

    pub async fn build(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "npm run build --silent", cancel).await.map(drop)
    }

    pub async fn publish(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(unit, "npm publish", cancel).await.map(drop)
    }

    /// Shasum of the tarball the current sources would publish
    pub async fn current_sha(
        &self,
        unit: &Unit,
        cancel: &CancellationToken,
    ) -> Result<String, BuildError> {
        let output = self
            .run(unit, "npm publish --dry-run --json", cancel)
            .await?;
        let value = parse_json_output(unit, &output)?;
        find_shasum(&value).ok_or_else(|| BuildError::Manifest {
            path: unit.path.join(MANIFEST),
            error: "npm publish --dry-run reported no shasum".to_string(),
        })
    }

    /// Shasum of the latest published version, `None` if never published
    pub async fn latest_sha(
        &self,
        unit: &Unit,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, BuildError> {
        let output = match self.runner.run(&unit.path, "npm view --json", cancel).await {
            Ok(output) => output,
            Err(CommandError::Failed { output, .. }) if output.contains("E404") => {
                tracing::debug!("{} has never been published", unit.name);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let value = parse_json_output(unit, &output)?;
        Ok(value
            .pointer("/dist/shasum")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string))
    }

    /// Bump the patch version in `package.json`, returning `(old, new)`
    pub fn bump_version(&self, unit: &Unit) -> Result<(String, String), BuildError> {
        let path = unit.path.join(MANIFEST);
        let mut manifest: serde_json::Value = filesystem::read_json(&path)?;

        let current = manifest
            .get("version")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| BuildError::Manifest {
                path: path.clone(),
                error: "missing 'version' field".to_string(),
            })?
            .to_string();
        let next = version::bump_patch(&current).map_err(|e| BuildError::Manifest {
            path: path.clone(),
            error: e.to_string(),
        })?;

        manifest["version"] = serde_json::Value::String(next.clone());
        filesystem::write_json(&path, &manifest)?;

        tracing::info!("{} version: {current} -> {next}", unit.name);
        Ok((current, next))
    }
}

fn parse_json_output(unit: &Unit, output: &str) -> Result<serde_json::Value, BuildError> {
    // Lifecycle scripts may print before the JSON document
    let start = output.find('{').unwrap_or(0);
    serde_json::from_str(&output[start..]).map_err(|e| BuildError::Manifest {
        path: unit.path.join(MANIFEST),
        error: format!("unexpected npm output: {e}"),
    })
}

/// `shasum` at the top level (npm 6) or under the package name (npm 7+)
fn find_shasum(value: &serde_json::Value) -> Option<String> {
    if let Some(sha) = value.get("shasum").and_then(serde_json::Value::as_str) {
        return Some(sha.to_string());
    }
    value
        .as_object()?
        .values()
        .find_map(|v| v.get("shasum").and_then(serde_json::Value::as_str))
        .map(ToString::to_string)
}
