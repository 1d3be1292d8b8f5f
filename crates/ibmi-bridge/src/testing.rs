//! Scripted in-memory transport used by unit tests across the
//! workspace. Commands match on substrings; SQL answers replay in the
//! order they were queued.

use crate::{BridgeError, CommandOutput, Transport};
use async_trait::async_trait;
use ibmi_protocol::{JobHandle, JobLogEntry, RC_SUCCESS};
use std::collections::VecDeque;
use std::sync::Mutex;

struct CommandRule {
    needle: String,
    output: CommandOutput,
    once: bool,
}

#[derive(Clone)]
enum SqlAnswer {
    Rows(Vec<serde_json::Value>),
    Fail(String),
}

#[derive(Default)]
pub struct ScriptedTransport {
    command_rules: Mutex<Vec<CommandRule>>,
    sql_answers: Mutex<VecDeque<SqlAnswer>>,
    last_sql_answer: Mutex<Option<SqlAnswer>>,
    job_log: Mutex<Vec<JobLogEntry>>,
    commands_run: Mutex<Vec<String>>,
    sql_run: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any command containing `needle` fails with the given rc/stderr.
    pub fn fail_command(&self, needle: &str, rc: i32, stderr: &str) {
        self.command_rules.lock().unwrap().push(CommandRule {
            needle: needle.to_string(),
            output: CommandOutput {
                rc,
                stdout: String::new(),
                stderr: stderr.to_string(),
                job_log: Vec::new(),
            },
            once: false,
        });
    }

    /// Like [`fail_command`], but only the first match fails.
    pub fn fail_command_once(&self, needle: &str, rc: i32, stderr: &str) {
        self.command_rules.lock().unwrap().push(CommandRule {
            needle: needle.to_string(),
            output: CommandOutput {
                rc,
                stdout: String::new(),
                stderr: stderr.to_string(),
                job_log: Vec::new(),
            },
            once: true,
        });
    }

    pub fn on_command(&self, needle: &str, output: CommandOutput) {
        self.command_rules.lock().unwrap().push(CommandRule {
            needle: needle.to_string(),
            output,
            once: false,
        });
    }

    /// Queue one `run_sql` answer; answers replay FIFO and the last one
    /// repeats once the queue drains.
    pub fn push_sql_rows(&self, rows: Vec<serde_json::Value>) {
        self.sql_answers
            .lock()
            .unwrap()
            .push_back(SqlAnswer::Rows(rows));
    }

    pub fn fail_next_sql(&self, message: &str) {
        self.sql_answers
            .lock()
            .unwrap()
            .push_back(SqlAnswer::Fail(message.to_string()));
    }

    pub fn set_job_log(&self, entries: Vec<JobLogEntry>) {
        *self.job_log.lock().unwrap() = entries;
    }

    pub fn commands_run(&self) -> Vec<String> {
        self.commands_run.lock().unwrap().clone()
    }

    pub fn sql_run(&self) -> Vec<String> {
        self.sql_run.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn run_command(&self, command: &str) -> Result<CommandOutput, BridgeError> {
        self.commands_run.lock().unwrap().push(command.to_string());
        let mut rules = self.command_rules.lock().unwrap();
        if let Some(position) = rules
            .iter()
            .position(|rule| command.contains(&rule.needle))
        {
            let output = rules[position].output.clone();
            if rules[position].once {
                rules.remove(position);
            }
            return Ok(output);
        }
        Ok(CommandOutput {
            rc: RC_SUCCESS,
            stdout: format!("+++ success {command}"),
            stderr: String::new(),
            job_log: Vec::new(),
        })
    }

    async fn run_sql(&self, sql: &str) -> Result<Vec<serde_json::Value>, BridgeError> {
        self.sql_run.lock().unwrap().push(sql.to_string());
        let popped = self.sql_answers.lock().unwrap().pop_front();
        let answer = match popped {
            Some(answer) => {
                *self.last_sql_answer.lock().unwrap() = Some(answer.clone());
                Some(answer)
            }
            // keep replaying the final answer for pollers
            None => self.last_sql_answer.lock().unwrap().clone(),
        };
        match answer {
            Some(SqlAnswer::Rows(rows)) => Ok(rows),
            Some(SqlAnswer::Fail(message)) => Err(BridgeError::Rpc {
                message,
                job_log: Vec::new(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn job_log_since(
        &self,
        _job: Option<&JobHandle>,
        _since: Option<&str>,
    ) -> Result<Vec<JobLogEntry>, BridgeError> {
        Ok(self.job_log.lock().unwrap().clone())
    }
}
