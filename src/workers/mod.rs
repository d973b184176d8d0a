//! Worker implementations
//!
//! One [`Worker`](crate::core::worker::Worker) per unit kind, each a fixed
//! sequence of phases over its toolchain service. A failing phase ends the
//! build; later phases never run.

pub mod golang;
pub mod helm;
pub mod npm;

use std::path::Path;
use std::sync::Arc;

use crate::core::config::ProjectConfig;
use crate::core::unit::UnitKind;
use crate::core::worker::WorkerRegistry;
use crate::infra::commander::CommandRunner;
use crate::infra::golang::GoService;
use crate::infra::helm::HelmService;
use crate::infra::npm::NpmService;
use crate::infra::stamps::StampStore;

pub use golang::GoWorker;
pub use helm::HelmWorker;
pub use npm::NpmWorker;

/// Phase names reported through [`PhaseReporter`](crate::core::signal::PhaseReporter)
pub mod phase {
    pub const CHECK: &str = "check";
    pub const INSTALL: &str = "install";
    pub const TIDY: &str = "tidy";
    pub const LINT: &str = "lint";
    pub const TEST: &str = "test";
    pub const BUILD: &str = "build";
    pub const BUMP: &str = "bump";
    pub const PUBLISH: &str = "publish";
}

/// Registry with the NPM, Helm and Go workers for a target directory
pub fn default_registry(
    config: &ProjectConfig,
    root: &Path,
    runner: Arc<dyn CommandRunner>,
) -> WorkerRegistry {
    let stamps = StampStore::new(root);
    let ignored = config.ignored_dirs();

    WorkerRegistry::new()
        .with(
            UnitKind::Npm,
            Arc::new(NpmWorker::new(NpmService::new(runner.clone()))),
        )
        .with(
            UnitKind::Helm,
            Arc::new(HelmWorker::new(
                HelmService::new(runner.clone(), config.chart_repo()),
                stamps.clone(),
                ignored.clone(),
            )),
        )
        .with(
            UnitKind::Go,
            Arc::new(GoWorker::new(GoService::new(runner), stamps, ignored)),
        )
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::core::signal::{PhaseReporter, Signal};
    use crate::core::worker::BuildContext;

    /// Context whose phase reports can be read back with [`phases`]
    pub fn context(unit: &str, reinstall: bool) -> (BuildContext, mpsc::Receiver<Signal>) {
        let (tx, rx) = mpsc::channel(32);
        let ctx = BuildContext {
            reinstall,
            cancel: CancellationToken::new(),
            progress: PhaseReporter::new(unit, tx),
        };
        (ctx, rx)
    }

    /// Phases reported so far, in order
    pub fn phases(rx: &mut mpsc::Receiver<Signal>) -> Vec<String> {
        let mut phases = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            if let Signal::Progress { phase, .. } = signal {
                phases.push(phase);
            }
        }
        phases
    }
}
