use serde::{Deserialize, Serialize};

pub mod job;
pub mod outcome;

pub use job::{JobHandle, JobLogEntry, JobStatus};
pub use outcome::TaskOutcome;

pub const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:47825";

/// Return codes carried in every task result.
pub const RC_SUCCESS: i32 = 0;
pub const RC_ERROR: i32 = 255;
pub const RC_JOB_STATUS_NOT_EXPECTED: i32 = 258;
pub const RC_PARAM_NOT_VALID: i32 = 259;
pub const RC_UNEXPECTED: i32 = 999;

pub fn describe_rc(rc: i32) -> &'static str {
    match rc {
        RC_SUCCESS => "Success",
        RC_ERROR => "Generic failure",
        RC_JOB_STATUS_NOT_EXPECTED => "The returned status of the submitted job is not expected",
        RC_PARAM_NOT_VALID => "Parameter passed is not valid",
        RC_UNEXPECTED => "Unexpected error",
        _ => "Unknown error",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    RunCommand {
        id: String,
        command: String,
    },
    RunSql {
        id: String,
        sql: String,
    },
    JobLog {
        id: String,
        job: String,
        #[serde(default)]
        since: Option<String>,
    },
}

impl BridgeRequest {
    pub fn id(&self) -> &str {
        match self {
            BridgeRequest::RunCommand { id, .. }
            | BridgeRequest::RunSql { id, .. }
            | BridgeRequest::JobLog { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeResponse {
    Success {
        id: String,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        rows: Vec<serde_json::Value>,
        #[serde(default)]
        job_log: Vec<JobLogEntry>,
    },
    Error {
        id: String,
        message: String,
        #[serde(default)]
        job_log: Vec<JobLogEntry>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_request_roundtrip() {
        let request = BridgeRequest::RunCommand {
            id: "req-1".to_string(),
            command: "QSYS/CRTSAVF FILE(QGPL/ARCHIVE)".to_string(),
        };
        let json = serde_json::to_string(&request).expect("serialize");
        let decoded: BridgeRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(request, decoded);
    }

    #[test]
    fn bridge_error_defaults_to_empty_job_log() {
        let json = r#"{"type":"error","id":"req-2","message":"CPF2111: Library exists."}"#;
        let decoded: BridgeResponse = serde_json::from_str(json).expect("deserialize");
        match decoded {
            BridgeResponse::Error { message, job_log, .. } => {
                assert!(message.starts_with("CPF2111"));
                assert!(job_log.is_empty());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn describe_rc_covers_known_codes() {
        assert_eq!(describe_rc(RC_SUCCESS), "Success");
        assert_eq!(describe_rc(RC_ERROR), "Generic failure");
        assert_eq!(describe_rc(-17), "Unknown error");
    }
}
