use crate::job::JobLogEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result document printed for every task run. Always carries `rc`;
/// failures additionally carry `failed: true` and `msg`. Stream fields
/// keep the conventional line-split twins alongside the raw text.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskOutcome {
    pub rc: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub stdout_lines: Vec<String>,
    #[serde(default)]
    pub stderr_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_log: Vec<JobLogEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TaskOutcome {
    pub fn success(rc: i32) -> Self {
        Self {
            rc,
            ..Self::default()
        }
    }

    pub fn failure(rc: i32, msg: impl Into<String>) -> Self {
        Self {
            rc,
            failed: true,
            msg: Some(msg.into()),
            ..Self::default()
        }
    }

    pub fn with_streams(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self.stdout_lines = split_lines(&self.stdout);
        self.stderr_lines = split_lines(&self.stderr);
        self
    }

    pub fn with_job_log(mut self, job_log: Vec<JobLogEntry>) -> Self {
        self.job_log = job_log;
        self
    }

    /// Attach a module-specific field (`job_submitted`, `delta`, ...).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_failed_and_msg() {
        let outcome = TaskOutcome::success(0).with_streams("line one\nline two", "");
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["rc"], 0);
        assert!(json.get("failed").is_none());
        assert!(json.get("msg").is_none());
        assert_eq!(json["stdout_lines"].as_array().unwrap().len(), 2);
        assert_eq!(json["stderr_lines"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn failure_carries_msg() {
        let outcome = TaskOutcome::failure(255, "Submit job failed.");
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["failed"], true);
        assert_eq!(json["msg"], "Submit job failed.");
    }

    #[test]
    fn extra_fields_flatten_to_top_level() {
        let outcome = TaskOutcome::success(0)
            .with_field("job_submitted", "123456/QPGMR/PAYROLL")
            .with_field("delta", "0:00:12");
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["job_submitted"], "123456/QPGMR/PAYROLL");
        assert_eq!(json["delta"], "0:00:12");
    }
}
