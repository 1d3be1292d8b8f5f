use async_trait::async_trait;
use ibmi_protocol::{JobHandle, JobLogEntry, RC_SUCCESS};
use std::fmt;

pub mod shell;
pub mod testing;
pub mod xmlservice;

pub use shell::ShellRunner;
pub use xmlservice::XmlserviceBridge;

/// What a remote CL command produced. A non-zero `rc` with vendor error
/// text is a normal, reportable result, not a transport failure.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
    pub job_log: Vec<JobLogEntry>,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.rc == RC_SUCCESS
    }
}

/// Transport-level failures. Produced when the bridge itself is broken,
/// never for a remote command that merely returned an error.
#[derive(Debug)]
pub enum BridgeError {
    /// The bridge endpoint is missing or unreachable. Reported once at
    /// connect time, before any work begins.
    Unavailable { addr: String, reason: String },
    /// The bridge rejected an RPC (bad SQL, dead session).
    Rpc {
        message: String,
        job_log: Vec<JobLogEntry>,
    },
    /// The bridge answered with something we could not understand.
    Protocol(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Unavailable { addr, reason } => {
                write!(f, "bridge unavailable at {addr}: {reason}")
            }
            BridgeError::Rpc { message, .. } => write!(f, "bridge rpc failed: {message}"),
            BridgeError::Protocol(message) => write!(f, "bridge protocol error: {message}"),
        }
    }
}

impl std::error::Error for BridgeError {}

/// The seam between task logic and the remote system. One implementation
/// speaks to the XMLSERVICE gateway, one shells out locally; tests use
/// the scripted fake in [`testing`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one CL command. Remote failures come back inside the output.
    async fn run_command(&self, command: &str) -> Result<CommandOutput, BridgeError>;

    /// Run one SQL statement and return its rows. SQL failures are
    /// bridge errors; there is nothing partial to report.
    async fn run_sql(&self, sql: &str) -> Result<Vec<serde_json::Value>, BridgeError>;

    /// Fetch job log entries newer than `since` (RFC3339). `None` for
    /// the job means the bridge session's own job.
    async fn job_log_since(
        &self,
        job: Option<&JobHandle>,
        since: Option<&str>,
    ) -> Result<Vec<JobLogEntry>, BridgeError>;
}

/// `QSYS2.OBJECT_STATISTICS` existence probe shared by the install
/// modules. Errors are treated as "absent", matching the conservative
/// behavior operators rely on before a create step.
pub async fn object_exists<T: Transport + ?Sized>(
    transport: &T,
    library: &str,
    object_type: &str,
    object: &str,
) -> bool {
    let sql = format!(
        "SELECT COUNT(*) AS CNT FROM TABLE (QSYS2.OBJECT_STATISTICS('{library}','{object_type}','{object}')) X"
    );
    match transport.run_sql(&sql).await {
        Ok(rows) => rows
            .first()
            .and_then(|row| row.get("CNT").or_else(|| row.get("00001")))
            .and_then(serde_json::Value::as_i64)
            .map(|count| count != 0)
            .unwrap_or(false),
        Err(err) => {
            tracing::debug!(error = %err, object, "object existence probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;

    #[tokio::test]
    async fn object_exists_reads_count_column() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(vec![serde_json::json!({"CNT": 1})]);
        assert!(object_exists(&transport, "QSYS", "*DEVD", "REPODEV").await);

        transport.push_sql_rows(vec![serde_json::json!({"CNT": 0})]);
        assert!(!object_exists(&transport, "QSYS", "*DEVD", "REPODEV").await);
    }

    #[tokio::test]
    async fn object_exists_defaults_to_absent_on_sql_error() {
        let transport = ScriptedTransport::new();
        transport.fail_next_sql("SQL0204: object not found");
        assert!(!object_exists(&transport, "QUSRSYS", "*IMGCLG", "REPOCLG").await);
    }
}
