//! Go worker

use async_trait::async_trait;

use super::phase;
use crate::core::signal::Outcome;
use crate::core::unit::Unit;
use crate::core::worker::{BuildContext, Worker};
use crate::error::BuildError;
use crate::infra::golang::GoService;
use crate::infra::stamps::StampStore;

/// Tests modules and builds the ones with a `main.go`
pub struct GoWorker {
    go: GoService,
    stamps: StampStore,
    ignored: Vec<String>,
}

impl GoWorker {
    pub fn new(go: GoService, stamps: StampStore, ignored: Vec<String>) -> Self {
        Self { go, stamps, ignored }
    }
}

#[async_trait]
impl Worker for GoWorker {
    async fn build(&self, unit: &Unit, ctx: &BuildContext) -> Result<Outcome, BuildError> {
        tracing::debug!("Building Go unit: {}", unit.name);
        let cancel = &ctx.cancel;
        let progress = &ctx.progress;

        if ctx.reinstall {
            progress.phase(phase::TIDY).await;
            self.go.tidy(unit, cancel).await?;

            progress.phase(phase::INSTALL).await;
            self.go.install(unit, cancel).await?;
        } else {
            progress.phase(phase::CHECK).await;
            let digest = self.stamps.digest_unit(unit, &self.ignored)?;
            if self.stamps.is_current(&unit.name, &digest) {
                tracing::info!("{} unchanged since last build", unit.name);
                return Ok(Outcome::Skipped);
            }
        }

        progress.phase(phase::TEST).await;
        self.go.test(unit, cancel).await?;

        if self.go.buildable(unit) {
            progress.phase(phase::BUILD).await;
            self.go.build(unit, cancel).await?;
        }

        let digest = self.stamps.digest_unit(unit, &self.ignored)?;
        self.stamps.write(&unit.name, &digest)?;
        Ok(Outcome::Built)
    }
}
