use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Qualified job name as returned by the system: `NNNNNN/USER/JOBNAME`.
/// Treated as an opaque token once parsed; only used to re-query status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    pub number: String,
    pub user: String,
    pub name: String,
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.number, self.user, self.name)
    }
}

impl FromStr for JobHandle {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split('/');
        let (number, user, name) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(number), Some(user), Some(name), None) => (number, user, name),
            _ => return Err(format!("not a qualified job name: {raw}")),
        };
        if number.len() != 6 || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("job number must be 6 digits: {raw}"));
        }
        if !valid_job_part(user) || !valid_job_part(name) {
            return Err(format!("not a qualified job name: {raw}"));
        }
        Ok(Self {
            number: number.to_string(),
            user: user.to_string(),
            name: name.to_string(),
        })
    }
}

fn valid_job_part(part: &str) -> bool {
    !part.is_empty()
        && part.len() <= 10
        && part
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'#' || b == b'_')
}

/// Job status values surfaced by QSYS2.GET_JOB_INFO. The authoritative
/// state lives on the remote system and is re-fetched on every query;
/// nothing here is a local state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    None,
    Active,
    Complete,
    JobQueue,
    OutQueue,
    Unknown,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::None => "*NONE",
            JobStatus::Active => "*ACTIVE",
            JobStatus::Complete => "*COMPLETE",
            JobStatus::JobQueue => "*JOBQ",
            JobStatus::OutQueue => "*OUTQ",
            JobStatus::Unknown => "*UNKNOWN",
            JobStatus::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "*NONE" => JobStatus::None,
            "*ACTIVE" => JobStatus::Active,
            "*COMPLETE" => JobStatus::Complete,
            "*JOBQ" => JobStatus::JobQueue,
            "*OUTQ" => JobStatus::OutQueue,
            "*UNKNOWN" => JobStatus::Unknown,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of QSYS2.JOBLOG_INFO, surfaced verbatim for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JobLogEntry {
    #[serde(rename = "MESSAGE_ID", default)]
    pub message_id: String,
    #[serde(rename = "MESSAGE_TYPE", default)]
    pub message_type: String,
    #[serde(rename = "MESSAGE_TEXT", default)]
    pub message_text: String,
    #[serde(rename = "MESSAGE_TIMESTAMP", default)]
    pub message_timestamp: String,
}
