//! Helm worker

use async_trait::async_trait;

use super::phase;
use crate::core::signal::Outcome;
use crate::core::unit::Unit;
use crate::core::worker::{BuildContext, Worker};
use crate::error::BuildError;
use crate::infra::helm::HelmService;
use crate::infra::stamps::StampStore;

/// Lints, bumps and pushes charts whose sources changed since the last push
pub struct HelmWorker {
    helm: HelmService,
    stamps: StampStore,
    ignored: Vec<String>,
}

impl HelmWorker {
    pub fn new(helm: HelmService, stamps: StampStore, ignored: Vec<String>) -> Self {
        Self {
            helm,
            stamps,
            ignored,
        }
    }
}

#[async_trait]
impl Worker for HelmWorker {
    async fn build(&self, unit: &Unit, ctx: &BuildContext) -> Result<Outcome, BuildError> {
        tracing::debug!("Building Helm unit: {}", unit.name);
        let cancel = &ctx.cancel;
        let progress = &ctx.progress;

        if ctx.reinstall {
            progress.phase(phase::INSTALL).await;
            self.helm.install(unit, cancel).await?;
        } else {
            progress.phase(phase::CHECK).await;
            let digest = self.stamps.digest_unit(unit, &self.ignored)?;
            if self.stamps.is_current(&unit.name, &digest) {
                tracing::info!("{} unchanged since last publish", unit.name);
                return Ok(Outcome::Skipped);
            }
        }

        progress.phase(phase::LINT).await;
        self.helm.lint(unit, cancel).await?;

        progress.phase(phase::BUMP).await;
        self.helm.bump_version(unit)?;

        progress.phase(phase::PUBLISH).await;
        self.helm.publish(unit, cancel).await?;

        let digest = self.stamps.digest_unit(unit, &self.ignored)?;
        self.stamps.write(&unit.name, &digest)?;
        Ok(Outcome::Built)
    }
}
