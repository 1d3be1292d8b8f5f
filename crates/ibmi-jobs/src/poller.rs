use ibmi_bridge::{BridgeError, Transport};
use ibmi_protocol::{JobHandle, JobStatus};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// The two historical orderings of the poll loop body. Submit-style
/// callers re-query first and sleep after; the fix-download caller
/// sleeps first and checks the clock before re-querying. The orderings
/// are not equivalent around the timeout boundary, so both are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOrder {
    QueryThenSleep,
    SleepThenQuery,
}

#[derive(Debug, Clone)]
pub struct PollSpec {
    pub accept: Vec<JobStatus>,
    pub interval: Duration,
    pub timeout: Duration,
    pub order: PollOrder,
}

#[derive(Debug, Clone)]
pub struct PollResult {
    /// Last observed status, whether or not it was acceptable. The
    /// caller distinguishes timeout from success by membership in the
    /// accepted set; there is no separate flag.
    pub status: JobStatus,
    /// Rows from the final status query, passed through for reporting.
    pub job_info: Vec<serde_json::Value>,
    /// Total status queries issued, including the initial one.
    pub queries: usize,
}

impl PollResult {
    pub fn accepted_by(&self, spec: &PollSpec) -> bool {
        spec.accept.contains(&self.status)
    }
}

pub fn job_info_sql(job: &JobHandle) -> String {
    format!(
        "SELECT V_JOB_STATUS as \"job_status\", \
         V_ACTIVE_JOB_STATUS as \"active_job_status\", \
         V_RUN_PRIORITY as \"run_priority\", \
         V_SBS_NAME as \"sbs_name\", \
         V_CLIENT_IP_ADDRESS as \"ip_address\" \
         FROM TABLE(QSYS2.GET_JOB_INFO('{job}')) A"
    )
}

fn status_from_rows(rows: &[serde_json::Value]) -> JobStatus {
    if rows.len() == 1 {
        if let Some(raw) = rows[0].get("job_status").and_then(serde_json::Value::as_str) {
            return JobStatus::parse(raw);
        }
    }
    // not a single-row answer; treated as not-yet-acceptable
    JobStatus::parse("")
}

/// Poll the remote job until its status lands in the accepted set or the
/// timeout elapses. The remote scheduler is authoritative; every
/// iteration re-fetches. A failing status query aborts immediately:
/// only the status value is retried, never the query mechanism.
pub async fn wait_for_status<T: Transport + ?Sized>(
    transport: &T,
    job: &JobHandle,
    spec: &PollSpec,
) -> Result<PollResult, BridgeError> {
    let sql = job_info_sql(job);
    let start = Instant::now();
    let mut job_info = transport.run_sql(&sql).await?;
    let mut queries = 1;
    let mut status = status_from_rows(&job_info);
    tracing::debug!(job = %job, status = %status, "initial job status");

    match spec.order {
        PollOrder::QueryThenSleep => {
            while !spec.accept.contains(&status) {
                job_info = transport.run_sql(&sql).await?;
                queries += 1;
                status = status_from_rows(&job_info);
                tracing::debug!(job = %job, status = %status, "job status");
                sleep(spec.interval).await;
                if start.elapsed() > spec.timeout {
                    break;
                }
            }
        }
        PollOrder::SleepThenQuery => {
            while !spec.accept.contains(&status) {
                sleep(spec.interval).await;
                if start.elapsed() > spec.timeout {
                    break;
                }
                job_info = transport.run_sql(&sql).await?;
                queries += 1;
                status = status_from_rows(&job_info);
                tracing::debug!(job = %job, status = %status, "job status");
            }
        }
    }

    Ok(PollResult {
        status,
        job_info,
        queries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibmi_bridge::testing::ScriptedTransport;
    use serde_json::json;

    fn handle() -> JobHandle {
        "123456/QPGMR/PAYROLL".parse().unwrap()
    }

    fn status_row(status: &str) -> Vec<serde_json::Value> {
        vec![json!({"job_status": status})]
    }

    #[tokio::test]
    async fn returns_after_initial_query_when_already_acceptable() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(status_row("*COMPLETE"));
        let spec = PollSpec {
            accept: vec![JobStatus::Complete],
            interval: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
            order: PollOrder::QueryThenSleep,
        };
        let result = wait_for_status(&transport, &handle(), &spec).await.unwrap();
        assert_eq!(result.status, JobStatus::Complete);
        assert_eq!(result.queries, 1);
        assert!(result.accepted_by(&spec));
    }

    #[tokio::test]
    async fn polls_until_status_is_acceptable() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(status_row("*JOBQ"));
        transport.push_sql_rows(status_row("*JOBQ"));
        transport.push_sql_rows(status_row("*COMPLETE"));
        let spec = PollSpec {
            accept: vec![JobStatus::Complete],
            interval: Duration::from_millis(2),
            timeout: Duration::from_secs(5),
            order: PollOrder::QueryThenSleep,
        };
        let result = wait_for_status(&transport, &handle(), &spec).await.unwrap();
        assert_eq!(result.status, JobStatus::Complete);
        // initial query plus two polls
        assert_eq!(result.queries, 3);
    }

    #[tokio::test]
    async fn timeout_returns_last_observed_status() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(status_row("*JOBQ"));
        let spec = PollSpec {
            accept: vec![JobStatus::Complete],
            interval: Duration::from_millis(20),
            timeout: Duration::from_millis(50),
            order: PollOrder::QueryThenSleep,
        };
        let result = wait_for_status(&transport, &handle(), &spec).await.unwrap();
        assert_eq!(result.status, JobStatus::JobQueue);
        assert!(!result.accepted_by(&spec));
    }

    #[tokio::test]
    async fn sleep_first_ordering_times_out_without_requerying() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(status_row("*ACTIVE"));
        let spec = PollSpec {
            accept: vec![JobStatus::OutQueue, JobStatus::Unknown],
            interval: Duration::from_millis(30),
            timeout: Duration::from_millis(10),
            order: PollOrder::SleepThenQuery,
        };
        let result = wait_for_status(&transport, &handle(), &spec).await.unwrap();
        // the clock check sits between the sleep and the re-query
        assert_eq!(result.queries, 1);
        assert_eq!(result.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn query_failure_propagates_immediately() {
        let transport = ScriptedTransport::new();
        transport.fail_next_sql("SQL0443: GET_JOB_INFO failed");
        let spec = PollSpec {
            accept: vec![JobStatus::Complete],
            interval: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
            order: PollOrder::QueryThenSleep,
        };
        let err = wait_for_status(&transport, &handle(), &spec)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SQL0443"));
    }

    #[tokio::test]
    async fn missing_row_keeps_polling_until_timeout() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(Vec::new());
        let spec = PollSpec {
            accept: vec![JobStatus::Complete],
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(30),
            order: PollOrder::QueryThenSleep,
        };
        let result = wait_for_status(&transport, &handle(), &spec).await.unwrap();
        assert!(!result.accepted_by(&spec));
        assert!(result.job_info.is_empty());
    }
}
