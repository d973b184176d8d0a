//! NPM worker

use async_trait::async_trait;

use super::phase;
use crate::core::signal::Outcome;
use crate::core::unit::Unit;
use crate::core::worker::{BuildContext, Worker};
use crate::error::BuildError;
use crate::infra::npm::NpmService;

/// Lints, tests and then builds (applications) or publishes (libraries)
pub struct NpmWorker {
    npm: NpmService,
}

impl NpmWorker {
    pub fn new(npm: NpmService) -> Self {
        Self { npm }
    }
}

#[async_trait]
impl Worker for NpmWorker {
    async fn build(&self, unit: &Unit, ctx: &BuildContext) -> Result<Outcome, BuildError> {
        tracing::debug!("Building NPM unit: {}", unit.name);
        let cancel = &ctx.cancel;
        let progress = &ctx.progress;

        if ctx.reinstall {
            progress.phase(phase::INSTALL).await;
            self.npm.install(unit, cancel).await?;
        } else if !unit.application {
            progress.phase(phase::CHECK).await;
            let current = self.npm.current_sha(unit, cancel).await?;
            let latest = self.npm.latest_sha(unit, cancel).await?;
            if latest.as_deref() == Some(current.as_str()) {
                tracing::info!("{} matches its published tarball", unit.name);
                return Ok(Outcome::Skipped);
            }
        }

        progress.phase(phase::LINT).await;
        self.npm.lint(unit, cancel).await?;

        progress.phase(phase::TEST).await;
        self.npm.test(unit, cancel).await?;

        if unit.application {
            progress.phase(phase::BUILD).await;
            self.npm.build(unit, cancel).await?;
        } else {
            progress.phase(phase::BUMP).await;
            self.npm.bump_version(unit)?;

            progress.phase(phase::PUBLISH).await;
            self.npm.publish(unit, cancel).await?;
        }

        Ok(Outcome::Built)
    }
}
