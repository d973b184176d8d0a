//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geppetto::core::signal::Outcome;
use geppetto::core::unit::{Unit, UnitKind};
use geppetto::core::worker::{BuildContext, Worker, WorkerRegistry};
use geppetto::error::BuildError;
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Add an NPM package with the given dependencies
    pub fn add_package(&self, dir: &str, name: &str, deps: &[&str], application: bool) {
        let dependencies: serde_json::Map<String, serde_json::Value> =
            deps.iter().map(|d| (d.to_string(), "*".into())).collect();
        let scripts = if application {
            serde_json::json!({ "build": "vite build", "test": "jest" })
        } else {
            serde_json::json!({ "test": "jest" })
        };
        let manifest = serde_json::json!({
            "name": name,
            "version": "1.0.0",
            "scripts": scripts,
            "dependencies": dependencies,
        });
        self.create_file(&format!("{dir}/package.json"), &manifest.to_string());
    }

    /// Add a Helm chart with local dependencies
    pub fn add_chart(&self, dir: &str, name: &str, deps: &[&str]) {
        let mut content = format!("apiVersion: v2\nname: {name}\nversion: 0.1.0\n");
        if !deps.is_empty() {
            content.push_str("dependencies:\n");
            for dep in deps {
                content.push_str(&format!(
                    "  - name: {dep}\n    version: 0.1.0\n    repository: \"file://../{dep}\"\n"
                ));
            }
        }
        self.create_file(&format!("{dir}/Chart.yaml"), &content);
    }

    /// Add a Go module requiring other modules
    pub fn add_module(&self, dir: &str, module: &str, requires: &[&str], main: bool) {
        let mut content = format!("module {module}\n\ngo 1.21\n");
        for req in requires {
            content.push_str(&format!("\nrequire {req} v0.0.0\n"));
        }
        self.create_file(&format!("{dir}/go.mod"), &content);
        if main {
            self.create_file(&format!("{dir}/main.go"), "package main\n\nfunc main() {}\n");
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// What the scripted worker does for a unit
#[derive(Clone)]
pub enum Behavior {
    Build,
    Skip,
    Fail,
    Panic,
    /// Report these phases, then finish
    Phases(Vec<&'static str>),
    /// Wait at the barrier, then finish
    Barrier(Arc<tokio::sync::Barrier>),
    /// Run until the build is cancelled
    UntilCancelled,
}

/// Worker lifecycle events, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Ended(String),
}

/// Worker whose outcome per unit is scripted
///
/// Units without a script are built.
#[derive(Default)]
pub struct ScriptedWorker {
    behaviors: HashMap<String, Behavior>,
    events: Mutex<Vec<Event>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one unit
    pub fn with(mut self, unit: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(unit.to_string(), behavior);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Units in the order their workers started
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Ended(_) => None,
            })
            .collect()
    }

    /// Position of an event, if it happened
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// Highest number of workers running at once
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn build(&self, unit: &Unit, ctx: &BuildContext) -> Result<Outcome, BuildError> {
        self.events.lock().unwrap().push(Event::Started(unit.name.clone()));
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        // Give other dispatched workers a chance to overlap
        tokio::task::yield_now().await;

        let behavior = self
            .behaviors
            .get(&unit.name)
            .cloned()
            .unwrap_or(Behavior::Build);
        let result = match behavior {
            Behavior::Build => Ok(Outcome::Built),
            Behavior::Skip => Ok(Outcome::Skipped),
            Behavior::Fail => Err(BuildError::CommandFailed {
                command: "make".to_string(),
                error: "exited with exit status: 1".to_string(),
                output: format!("{} is broken", unit.name),
            }),
            Behavior::Panic => panic!("worker exploded on {}", unit.name),
            Behavior::Phases(phases) => {
                for phase in phases {
                    ctx.progress.phase(phase).await;
                }
                Ok(Outcome::Built)
            }
            Behavior::Barrier(barrier) => {
                barrier.wait().await;
                Ok(Outcome::Built)
            }
            Behavior::UntilCancelled => {
                ctx.cancel.cancelled().await;
                Err(BuildError::Cancelled)
            }
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Ended(unit.name.clone()));
        result
    }
}

/// Registry routing every kind to the same scripted worker
pub fn registry(worker: &Arc<ScriptedWorker>) -> WorkerRegistry {
    [UnitKind::Npm, UnitKind::Helm, UnitKind::Go]
        .into_iter()
        .fold(WorkerRegistry::new(), |registry, kind| {
            registry.with(kind, worker.clone())
        })
}

/// NPM unit with dependencies; paths are irrelevant to scripted workers
pub fn unit(name: &str, deps: &[&str]) -> Unit {
    Unit::new(name, UnitKind::Npm, format!("/repo/{name}")).with_dependencies(deps.iter().copied())
}
