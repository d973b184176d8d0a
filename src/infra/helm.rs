//! Helm toolchain service
//!
//! `Chart.yaml` parsing plus the helm commands the Helm worker runs.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::core::unit::Unit;
use crate::core::version;
use crate::error::BuildError;
use crate::infra::commander::CommandRunner;
use crate::infra::filesystem;

/// Manifest file name
pub const MANIFEST: &str = "Chart.yaml";

/// Extra values used by `helm lint` when present
pub const LINT_VALUES: &str = "lint-values.yaml";

/// The parts of `Chart.yaml` geppetto cares about
#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<ChartDependency>>,
}

/// One entry of `dependencies:`
#[derive(Debug, Clone, Deserialize)]
pub struct ChartDependency {
    pub name: String,
    #[serde(default)]
    pub repository: Option<String>,
}

impl ChartDependency {
    /// Dependency served from this repository rather than a remote registry
    pub fn is_local(&self) -> bool {
        self.repository
            .as_deref()
            .is_some_and(|r| r == "@local" || r.starts_with("file://"))
    }
}

impl Chart {
    /// Names of local chart dependencies
    pub fn local_dependencies(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .flatten()
            .filter(|d| d.is_local())
            .map(|d| d.name.clone())
            .collect()
    }
}

/// Read `Chart.yaml` from a chart directory
pub fn read_chart(dir: &Path) -> Result<Chart, BuildError> {
    Ok(filesystem::read_yaml(&dir.join(MANIFEST))?)
}

/// helm commands for one chart directory at a time
#[derive(Clone)]
pub struct HelmService {
    runner: Arc<dyn CommandRunner>,
    chart_repo: String,
}

impl HelmService {
    pub fn new(runner: Arc<dyn CommandRunner>, chart_repo: impl Into<String>) -> Self {
        Self {
            runner,
            chart_repo: chart_repo.into(),
        }
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

    /// Refresh chart dependencies
    pub async fn install(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        self.run(
            unit,
            "rm -rf tmpcharts && helm repo update && helm dep update",
            cancel,
        )
        .await
    }

    pub async fn lint(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        let mut command = "helm lint --values values.yaml".to_string();
        if unit.path.join(LINT_VALUES).exists() {
            command.push_str(" --values ");
            command.push_str(LINT_VALUES);
        }
        self.run(unit, &command, cancel).await
    }

    /// Push the chart to the configured registry
    pub async fn publish(&self, unit: &Unit, cancel: &CancellationToken) -> Result<(), BuildError> {
        let command = format!("helm push . {}", self.chart_repo);
        self.run(unit, &command, cancel).await
    }

    /// Bump the patch version in `Chart.yaml`, returning `(old, new)`
    pub fn bump_version(&self, unit: &Unit) -> Result<(String, String), BuildError> {
        let path = unit.path.join(MANIFEST);
        let mut chart: serde_yaml::Value = filesystem::read_yaml(&path)?;

        let current = chart
            .get("version")
            .and_then(serde_yaml::Value::as_str)
            .ok_or_else(|| BuildError::Manifest {
                path: path.clone(),
                error: "missing 'version' field".to_string(),
            })?
            .to_string();
        let next = version::bump_patch(&current).map_err(|e| BuildError::Manifest {
            path: path.clone(),
            error: e.to_string(),
        })?;

        if let Some(mapping) = chart.as_mapping_mut() {
            mapping.insert("version".into(), next.clone().into());
        }
        filesystem::write_yaml(&path, &chart)?;

        tracing::info!("{} chart version: {current} -> {next}", unit.name);
        Ok((current, next))
    }
}
