use crate::{BridgeError, CommandOutput, Transport};
use async_trait::async_trait;
use ibmi_protocol::{JobHandle, JobLogEntry};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs CL commands through the local `system` utility when the task is
/// executed on the IBM i host itself. SQL and job-log queries need the
/// Db2 session the gateway owns, so they are not available here.
pub struct ShellRunner {
    program: String,
    args: Vec<String>,
    command_timeout: Duration,
}

impl ShellRunner {
    /// `command_line` is the operator-configured runner, e.g. `system`
    /// or `ssh prod-ibmi system`.
    pub fn new(command_line: &str, command_timeout: Duration) -> anyhow::Result<Self> {
        let mut words = shell_words::split(command_line)
            .map_err(|err| anyhow::anyhow!("invalid runner command line: {err}"))?;
        if words.is_empty() {
            anyhow::bail!("runner command line cannot be empty");
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            command_timeout,
        })
    }
}

#[async_trait]
impl Transport for ShellRunner {
    async fn run_command(&self, command: &str) -> Result<CommandOutput, BridgeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!(command, "running CL command via shell runner");
        let child = cmd.spawn().map_err(|err| BridgeError::Unavailable {
            addr: self.program.clone(),
            reason: err.to_string(),
        })?;
        let output = match timeout(self.command_timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|err| BridgeError::Protocol(err.to_string()))?,
            Err(_) => {
                return Err(BridgeError::Protocol(format!(
                    "command timed out after {}s",
                    self.command_timeout.as_secs()
                )));
            }
        };
        Ok(CommandOutput {
            rc: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            job_log: Vec::new(),
        })
    }

    async fn run_sql(&self, _sql: &str) -> Result<Vec<serde_json::Value>, BridgeError> {
        Err(BridgeError::Protocol(
            "SQL is not available through the shell runner; configure the bridge gateway".to_string(),
        ))
    }

    async fn job_log_since(
        &self,
        _job: Option<&JobHandle>,
        _since: Option<&str>,
    ) -> Result<Vec<JobLogEntry>, BridgeError> {
        Ok(Vec::new())
    }
}
