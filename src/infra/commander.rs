//! External command execution
//!
//! Toolchain steps (`npm test`, `helm lint`, `go build`, ...) run through a
//! [`CommandRunner`] so workers can be exercised without the toolchains.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::defaults::SHELL;
use crate::error::CommandError;

/// Runs shell commands in a working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` and return its trimmed stdout
    ///
    /// A non-zero exit status is an error carrying both output streams.
    /// Cancellation kills the child process.
    async fn run(
        &self,
        work_dir: &Path,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CommandError>;
}

/// [`CommandRunner`] backed by `bash -c`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        work_dir: &Path,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CommandError> {
        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled {
                command: command.to_string(),
            });
        }

        tracing::debug!("Command running in {}: `{command}`", work_dir.display());

        let child = Command::new(SHELL)
            .arg("-c")
            .arg(command)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn {
                command: command.to_string(),
                error: e.to_string(),
            })?;

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|e| CommandError::Spawn {
                command: command.to_string(),
                error: e.to_string(),
            })?,
            () = cancel.cancelled() => {
                tracing::info!("Command cancelled: `{command}`");
                return Err(CommandError::Cancelled { command: command.to_string() });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!("Command `{command}` stdout: {stdout}");
        if !stderr.is_empty() {
            tracing::debug!("Command `{command}` stderr: {stderr}");
        }

        if output.status.success() {
            Ok(stdout)
        } else {
            Err(CommandError::Failed {
                command: command.to_string(),
                status: output.status.to_string(),
                output: [stdout, stderr]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Runner that answers from a script instead of spawning processes
    ///
    /// Each rule matches commands containing its pattern; the first match
    /// wins. Unmatched commands succeed with empty output.
    #[derive(Default)]
    pub struct ScriptedRunner {
        rules: Vec<(String, Result<String, String>)>,
        log: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer matching commands with `stdout`
        pub fn ok(mut self, pattern: &str, stdout: &str) -> Self {
            self.rules.push((pattern.to_string(), Ok(stdout.to_string())));
            self
        }

        /// Fail matching commands with `output`
        pub fn fail(mut self, pattern: &str, output: &str) -> Self {
            self.rules.push((pattern.to_string(), Err(output.to_string())));
            self
        }

        /// Commands run so far
        pub fn commands(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        /// Whether any run command contains `pattern`
        pub fn ran(&self, pattern: &str) -> bool {
            self.commands().iter().any(|c| c.contains(pattern))
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            _work_dir: &Path,
            command: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, CommandError> {
            self.log.lock().unwrap().push(command.to_string());
            let rule = self.rules.iter().find(|(pattern, _)| command.contains(pattern.as_str()));
            match rule {
                Some((_, Ok(stdout))) => Ok(stdout.clone()),
                Some((_, Err(output))) => Err(CommandError::Failed {
                    command: command.to_string(),
                    status: "exit status: 1".to_string(),
                    output: output.clone(),
                }),
                None => Ok(String::new()),
            }
        }
    }
}
