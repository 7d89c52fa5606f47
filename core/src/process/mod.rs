use crate::traits::{CommandOutput, CommandSpec, ProcessRunner, RunError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Spawns real child processes on the tokio runtime.
///
/// The child is killed when the deadline passes: the pending `output()`
/// future is dropped and `kill_on_drop` reaps it. Grandchildren spawned by the
/// program (e.g. `git-remote-https`) are not tracked.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, RunError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        tracing::debug!(command = %spec, timeout_ms = timeout.as_millis() as u64, "Running command");

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(command = %spec, "Command timed out, child killed");
                return Err(RunError::Timeout(timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            Err(RunError::NonZeroExit {
                code: output.status.code(),
                stderr: spec.redact(&message),
            })
        }
    }
}
