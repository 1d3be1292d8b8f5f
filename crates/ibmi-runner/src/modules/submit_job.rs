use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_cl::Sbmjob;
use ibmi_jobs::duration::{parse_duration_or_zero, to_wait};
use ibmi_jobs::handle::find_submitted_job;
use ibmi_jobs::poller::{wait_for_status, PollOrder, PollSpec};
use ibmi_protocol::{
    describe_rc, JobStatus, TaskOutcome, RC_JOB_STATUS_NOT_EXPECTED, RC_PARAM_NOT_VALID,
    RC_UNEXPECTED,
};
use serde::Deserialize;

const VALID_STATUSES: [&str; 5] = ["*NONE", "*ACTIVE", "*COMPLETE", "*JOBQ", "*OUTQ"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) cmd: String,
    #[serde(default = "default_time_out")]
    pub(crate) time_out: String,
    #[serde(default = "default_status")]
    pub(crate) status: Vec<String>,
    #[serde(default = "default_check_interval")]
    pub(crate) check_interval: String,
    #[serde(default)]
    pub(crate) parameters: String,
}

fn default_time_out() -> String {
    "1m".to_string()
}

fn default_status() -> Vec<String> {
    vec!["*NONE".to_string()]
}

fn default_check_interval() -> String {
    "1m".to_string()
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let sbmjob_cmd = match Sbmjob::new(&params.cmd).parameters(&params.parameters).render() {
        Ok(command) => command,
        Err(err) => {
            return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, err.to_string()));
        }
    };

    if params
        .status
        .iter()
        .any(|status| !VALID_STATUSES.contains(&status.as_str()))
    {
        return Ok(TaskOutcome::failure(
            RC_PARAM_NOT_VALID,
            "Value specified for status option is not valid. Valid values are \
             *NONE, *ACTIVE, *COMPLETE, *JOBQ, *OUTQ",
        )
        .with_field("sbmjob_cmd", sbmjob_cmd));
    }

    let clock = TaskClock::start();
    let output = transport.run_command(&sbmjob_cmd).await?;
    let submit_log = transport
        .job_log_since(None, Some(&clock.start_stamp()))
        .await?;

    if !output.succeeded() {
        return Ok(TaskOutcome::failure(output.rc, "Submit job failed.")
            .with_streams(output.stdout, output.stderr)
            .with_job_log(submit_log)
            .with_field("sbmjob_cmd", sbmjob_cmd));
    }

    let handle = match find_submitted_job(&submit_log) {
        Some(handle) => handle,
        None => {
            return Ok(TaskOutcome::failure(
                RC_UNEXPECTED,
                "cannot find the submitted job in the job log",
            )
            .with_job_log(submit_log)
            .with_field("sbmjob_cmd", sbmjob_cmd));
        }
    };
    tracing::debug!(job = %handle, "job submitted");

    if params.status.iter().any(|status| status == "*NONE") {
        return Ok(TaskOutcome::success(output.rc)
            .with_field("job_submitted", handle.to_string())
            .with_field("sbmjob_cmd", sbmjob_cmd));
    }

    // historical fallback: unparsable wait times poll with zero delay
    let spec = PollSpec {
        accept: params.status.iter().map(|s| JobStatus::parse(s)).collect(),
        interval: to_wait(parse_duration_or_zero(&params.check_interval)),
        timeout: to_wait(parse_duration_or_zero(&params.time_out)),
        order: PollOrder::QueryThenSleep,
    };
    let poll = wait_for_status(transport, &handle, &spec).await?;

    let rc = if poll.accepted_by(&spec) {
        output.rc
    } else {
        RC_JOB_STATUS_NOT_EXPECTED
    };

    let base = if rc == RC_JOB_STATUS_NOT_EXPECTED {
        TaskOutcome::failure(rc, format!("non-zero return code: {}", describe_rc(rc)))
    } else {
        TaskOutcome::success(rc)
    };
    Ok(base
        .with_field("job_submitted", handle.to_string())
        .with_field("job_info", poll.job_info)
        .with_field("job_status", poll.status.to_string())
        .with_field("sbmjob_cmd", sbmjob_cmd)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibmi_bridge::testing::ScriptedTransport;
    use ibmi_protocol::{JobLogEntry, RC_ERROR};
    use serde_json::json;

    fn submit_log() -> Vec<JobLogEntry> {
        vec![JobLogEntry {
            message_id: "CPC1221".to_string(),
            message_text: "Job 123456/QPGMR/PAYROLL submitted to job queue QBATCH.".to_string(),
            ..JobLogEntry::default()
        }]
    }

    fn params(raw: &str) -> Params {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn none_status_returns_without_any_status_query() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(submit_log());
        let outcome = run(&transport, params(r#"{"cmd": "CRTLIB LIB(TESTLIB)"}"#))
            .await
            .unwrap();
        assert_eq!(outcome.rc, 0);
        assert!(!outcome.failed);
        assert_eq!(
            outcome.extra["job_submitted"],
            json!("123456/QPGMR/PAYROLL")
        );
        // *NONE means no polling at all
        assert!(transport.sql_run().is_empty());
    }

    #[tokio::test]
    async fn invalid_status_fails_before_any_remote_call() {
        let transport = ScriptedTransport::new();
        let outcome = run(
            &transport,
            params(r#"{"cmd": "CRTLIB LIB(TESTLIB)", "status": ["*DONE"]}"#),
        )
        .await
        .unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.rc, RC_PARAM_NOT_VALID);
        assert!(transport.commands_run().is_empty());
    }

    #[tokio::test]
    async fn submit_failure_is_reported_with_the_command() {
        let transport = ScriptedTransport::new();
        transport.fail_command("SBMJOB", RC_ERROR, "CPF1338: Errors occurred on SBMJOB command.");
        let outcome = run(&transport, params(r#"{"cmd": "CRTLIB LIB(TESTLIB)"}"#))
            .await
            .unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.msg.as_deref(), Some("Submit job failed."));
        assert!(outcome.stderr.contains("CPF1338"));
        assert!(outcome.extra["sbmjob_cmd"]
            .as_str()
            .unwrap()
            .starts_with("QSYS/SBMJOB"));
    }

    #[tokio::test]
    async fn waits_until_job_completes() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(submit_log());
        transport.push_sql_rows(vec![json!({"job_status": "*JOBQ"})]);
        transport.push_sql_rows(vec![json!({"job_status": "*ACTIVE"})]);
        transport.push_sql_rows(vec![json!({"job_status": "*COMPLETE"})]);
        let outcome = run(
            &transport,
            params(
                r#"{"cmd": "CRTLIB LIB(TESTLIB)", "status": ["*COMPLETE"],
                    "check_interval": "0s", "time_out": "1m"}"#,
            ),
        )
        .await
        .unwrap();
        assert!(!outcome.failed);
        assert_eq!(outcome.extra["job_status"], json!("*COMPLETE"));
    }

    #[tokio::test]
    async fn unexpected_final_status_fails_with_258() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(submit_log());
        transport.push_sql_rows(vec![json!({"job_status": "*JOBQ"})]);
        let outcome = run(
            &transport,
            params(
                r#"{"cmd": "CRTLIB LIB(TESTLIB)", "status": ["*COMPLETE"],
                    "check_interval": "0s", "time_out": "0s"}"#,
            ),
        )
        .await
        .unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.rc, RC_JOB_STATUS_NOT_EXPECTED);
        assert_eq!(outcome.extra["job_status"], json!("*JOBQ"));
    }
}
