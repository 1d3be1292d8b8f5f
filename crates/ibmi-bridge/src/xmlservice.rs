use crate::{BridgeError, CommandOutput, Transport};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use ibmi_protocol::{BridgeRequest, BridgeResponse, JobHandle, JobLogEntry, RC_ERROR, RC_SUCCESS};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use uuid::Uuid;

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-lines client for the XMLSERVICE gateway. One connection per
/// request; the gateway owns the Db2 session lifecycle.
pub struct XmlserviceBridge {
    addr: String,
    rpc_timeout: Duration,
}

impl XmlserviceBridge {
    /// Probe the gateway once so a missing bridge is a hard failure
    /// before any task work begins.
    pub async fn connect(addr: impl Into<String>) -> Result<Self, BridgeError> {
        let addr = addr.into();
        let probe = timeout(CONNECT_PROBE_TIMEOUT, TcpStream::connect(&addr)).await;
        match probe {
            Ok(Ok(_stream)) => Ok(Self {
                addr,
                rpc_timeout: DEFAULT_RPC_TIMEOUT,
            }),
            Ok(Err(err)) => Err(BridgeError::Unavailable {
                addr,
                reason: err.to_string(),
            }),
            Err(_) => Err(BridgeError::Unavailable {
                addr,
                reason: "connect timeout".to_string(),
            }),
        }
    }

    pub fn rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    async fn send_request(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let stream = timeout(CONNECT_PROBE_TIMEOUT, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| BridgeError::Unavailable {
                addr: self.addr.clone(),
                reason: "connect timeout".to_string(),
            })?
            .map_err(|err| BridgeError::Unavailable {
                addr: self.addr.clone(),
                reason: err.to_string(),
            })?;
        let mut framed = Framed::new(stream, LinesCodec::new());
        let payload = serde_json::to_string(&request)
            .map_err(|err| BridgeError::Protocol(err.to_string()))?;
        timeout(self.rpc_timeout, framed.send(payload))
            .await
            .map_err(|_| BridgeError::Protocol("bridge send timeout".to_string()))?
            .map_err(|err| BridgeError::Protocol(err.to_string()))?;
        let line = timeout(self.rpc_timeout, framed.next())
            .await
            .map_err(|_| BridgeError::Protocol("bridge read timeout".to_string()))?
            .ok_or_else(|| BridgeError::Protocol("bridge closed connection".to_string()))?
            .map_err(|err| BridgeError::Protocol(err.to_string()))?;
        let response: BridgeResponse =
            serde_json::from_str(&line).map_err(|err| BridgeError::Protocol(err.to_string()))?;
        let response_id = match &response {
            BridgeResponse::Success { id, .. } | BridgeResponse::Error { id, .. } => id.as_str(),
        };
        if response_id != request.id() {
            return Err(BridgeError::Protocol(format!(
                "response id {response_id} does not match request id {}",
                request.id()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for XmlserviceBridge {
    async fn run_command(&self, command: &str) -> Result<CommandOutput, BridgeError> {
        let request = BridgeRequest::RunCommand {
            id: Uuid::new_v4().to_string(),
            command: command.to_string(),
        };
        tracing::debug!(command, "running CL command over bridge");
        match self.send_request(request).await? {
            BridgeResponse::Success {
                output, job_log, ..
            } => Ok(CommandOutput {
                rc: RC_SUCCESS,
                stdout: output.unwrap_or_default(),
                stderr: String::new(),
                job_log,
            }),
            BridgeResponse::Error {
                message, job_log, ..
            } => Ok(CommandOutput {
                rc: RC_ERROR,
                stdout: String::new(),
                stderr: message,
                job_log,
            }),
        }
    }

    async fn run_sql(&self, sql: &str) -> Result<Vec<serde_json::Value>, BridgeError> {
        let request = BridgeRequest::RunSql {
            id: Uuid::new_v4().to_string(),
            sql: sql.to_string(),
        };
        tracing::debug!(sql, "running SQL over bridge");
        match self.send_request(request).await? {
            BridgeResponse::Success { rows, .. } => Ok(rows),
            BridgeResponse::Error {
                message, job_log, ..
            } => Err(BridgeError::Rpc { message, job_log }),
        }
    }

    async fn job_log_since(
        &self,
        job: Option<&JobHandle>,
        since: Option<&str>,
    ) -> Result<Vec<JobLogEntry>, BridgeError> {
        let request = BridgeRequest::JobLog {
            id: Uuid::new_v4().to_string(),
            job: job.map(|handle| handle.to_string()).unwrap_or_else(|| "*".to_string()),
            since: since.map(str::to_string),
        };
        match self.send_request(request).await? {
            BridgeResponse::Success { job_log, .. } => Ok(job_log),
            BridgeResponse::Error {
                message, job_log, ..
            } => Err(BridgeError::Rpc { message, job_log }),
        }
    }
}
