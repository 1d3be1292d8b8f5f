//! Ordered command sequences that provision remote resource chains
//! (virtual device, image catalog, NFS export) and undo what they
//! acquired when a step fails partway through.

use ibmi_bridge::{BridgeError, Transport};
use ibmi_protocol::{JobLogEntry, RC_SUCCESS};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Append-only (command, output) pairs, kept for operator diagnostics
/// only; never replayed.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    title: String,
    entries: Vec<(String, String)>,
}

impl CommandLog {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, command: impl Into<String>, output: impl Into<String>) {
        self.entries.push((command.into(), output.into()));
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn render(&self) -> String {
        let mut rendered = self.title.clone();
        for (command, output) in &self.entries {
            let _ = write!(rendered, "\n{command}\n{output}");
        }
        rendered
    }
}

/// Recovery for one classified vendor failure: when the step's error
/// mentions `message_id`, run the named command once and treat the step
/// as recovered if it succeeds.
#[derive(Debug, Clone)]
pub struct StepRecovery {
    pub message_id: String,
    pub command: String,
}

#[derive(Debug, Clone)]
struct PlannedStep {
    name: String,
    /// Undo suffix for a failure at this step, in execution order.
    /// Hand-coded per call site, not derived from the forward list.
    undo: Vec<String>,
    recovery: Option<StepRecovery>,
}

/// Everything a caller needs to report a failed sequence: the step that
/// broke, its own rc and output (never a rollback step's), and the full
/// command log.
#[derive(Debug, Clone)]
pub struct SequenceFailure {
    pub step: String,
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
    pub job_log: Vec<JobLogEntry>,
}

#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub log: CommandLog,
    pub failure: Option<SequenceFailure>,
}

impl SequenceReport {
    pub fn rc(&self) -> i32 {
        self.failure.as_ref().map(|failure| failure.rc).unwrap_or(RC_SUCCESS)
    }
}

/// An ordered forward plan over a named command map. Commands that only
/// exist for rollback are registered without a forward step.
#[derive(Debug, Clone)]
pub struct SequencePlan {
    title: String,
    commands: BTreeMap<String, String>,
    forward: Vec<PlannedStep>,
}

impl SequencePlan {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            commands: BTreeMap::new(),
            forward: Vec::new(),
        }
    }

    /// Register a command available for undo suffixes only.
    pub fn command(mut self, name: &str, text: impl Into<String>) -> Self {
        self.commands.insert(name.to_string(), text.into());
        self
    }

    /// Append a forward step with its undo suffix.
    pub fn step(mut self, name: &str, text: impl Into<String>, undo: &[&str]) -> Self {
        self.commands.insert(name.to_string(), text.into());
        self.forward.push(PlannedStep {
            name: name.to_string(),
            undo: undo.iter().map(|s| s.to_string()).collect(),
            recovery: None,
        });
        self
    }

    pub fn step_with_recovery(
        mut self,
        name: &str,
        text: impl Into<String>,
        undo: &[&str],
        recovery: StepRecovery,
    ) -> Self {
        self.commands.insert(name.to_string(), text.into());
        self.forward.push(PlannedStep {
            name: name.to_string(),
            undo: undo.iter().map(|s| s.to_string()).collect(),
            recovery: Some(recovery),
        });
        self
    }

    /// Run the forward steps in order. On the first failing step, run
    /// its undo suffix best-effort (when rollback is enabled), then
    /// report that step's error. Transport faults abort everything.
    pub async fn execute<T: Transport + ?Sized>(
        &self,
        transport: &T,
        rollback: bool,
    ) -> Result<SequenceReport, BridgeError> {
        let mut log = CommandLog::new(self.title.clone());
        for step in &self.forward {
            let command = match self.commands.get(&step.name) {
                Some(command) => command,
                None => continue,
            };
            tracing::info!(step = %step.name, command = %command, "running sequence step");
            let mut output = transport.run_command(command).await?;
            log.push(command.clone(), output.stdout.clone());

            if !output.succeeded() {
                if let Some(recovery) = &step.recovery {
                    if failure_mentions(&output, &recovery.message_id) {
                        tracing::info!(
                            step = %step.name,
                            message_id = %recovery.message_id,
                            "attempting step recovery"
                        );
                        let recovered = transport.run_command(&recovery.command).await?;
                        log.push(recovery.command.clone(), recovered.stdout.clone());
                        if recovered.succeeded() {
                            output = recovered;
                        }
                    }
                }
            }

            if !output.succeeded() {
                if rollback {
                    self.run_undo_suffix(transport, &step.undo, &mut log).await?;
                }
                return Ok(SequenceReport {
                    log,
                    failure: Some(SequenceFailure {
                        step: step.name.clone(),
                        rc: output.rc,
                        stdout: output.stdout,
                        stderr: output.stderr,
                        job_log: output.job_log,
                    }),
                });
            }
        }
        Ok(SequenceReport { log, failure: None })
    }

    /// Undo steps release partially-acquired resources; their own
    /// failures are logged and not escalated.
    async fn run_undo_suffix<T: Transport + ?Sized>(
        &self,
        transport: &T,
        undo: &[String],
        log: &mut CommandLog,
    ) -> Result<(), BridgeError> {
        for name in undo {
            let command = match self.commands.get(name) {
                Some(command) => command,
                None => {
                    tracing::warn!(step = %name, "undo step has no registered command");
                    continue;
                }
            };
            tracing::info!(step = %name, command = %command, "running rollback step");
            let output = transport.run_command(command).await?;
            log.push(command.clone(), output.stdout.clone());
            if !output.succeeded() {
                tracing::warn!(step = %name, rc = output.rc, "rollback step failed");
            }
        }
        Ok(())
    }
}

fn failure_mentions(output: &ibmi_bridge::CommandOutput, message_id: &str) -> bool {
    output.stderr.contains(message_id)
        || output
            .job_log
            .iter()
            .any(|entry| entry.message_id == message_id || entry.message_text.contains(message_id))
}
