use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_protocol::TaskOutcome;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) cmd: String,
    #[serde(default)]
    pub(crate) joblog: bool,
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let command = params.cmd.trim().to_string();
    if command.is_empty() {
        return Ok(TaskOutcome::failure(
            ibmi_protocol::RC_PARAM_NOT_VALID,
            "cmd cannot be empty",
        ));
    }

    let clock = TaskClock::start();
    let output = transport.run_command(&command).await?;

    let succeeded = output.succeeded();
    let mut job_log = output.job_log;
    if params.joblog || !succeeded {
        if job_log.is_empty() {
            job_log = transport
                .job_log_since(None, Some(&clock.start_stamp()))
                .await?;
        }
    } else {
        job_log = Vec::new();
    }

    let base = if succeeded {
        TaskOutcome::success(output.rc)
    } else {
        TaskOutcome::failure(output.rc, format!("CL command failed: {command}"))
    };
    Ok(base
        .with_streams(output.stdout, output.stderr)
        .with_job_log(job_log)
        .with_field("cmd", command)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibmi_bridge::testing::ScriptedTransport;
    use ibmi_protocol::{JobLogEntry, RC_ERROR};

    fn params(raw: &str) -> Params {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn success_without_joblog_keeps_the_log_out_of_the_result() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(vec![JobLogEntry {
            message_id: "CPC2102".to_string(),
            message_text: "Library TESTLIB created.".to_string(),
            ..JobLogEntry::default()
        }]);
        let outcome = run(&transport, params(r#"{"cmd": "CRTLIB LIB(TESTLIB)"}"#))
            .await
            .unwrap();
        assert!(!outcome.failed);
        assert!(outcome.job_log.is_empty());
        assert!(outcome.stdout.contains("CRTLIB"));
    }

    #[tokio::test]
    async fn failure_always_fetches_the_job_log() {
        let transport = ScriptedTransport::new();
        transport.fail_command("DLTLIB", RC_ERROR, "CPF2110: Library NOPE not found.");
        transport.set_job_log(vec![JobLogEntry {
            message_id: "CPF2110".to_string(),
            ..JobLogEntry::default()
        }]);
        let outcome = run(&transport, params(r#"{"cmd": "DLTLIB LIB(NOPE)"}"#))
            .await
            .unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.rc, RC_ERROR);
        assert_eq!(outcome.job_log.len(), 1);
        assert!(outcome.stderr.contains("CPF2110"));
    }

    #[tokio::test]
    async fn empty_command_fails_before_any_remote_call() {
        let transport = ScriptedTransport::new();
        let outcome = run(&transport, params(r#"{"cmd": "   "}"#)).await.unwrap();
        assert!(outcome.failed);
        assert!(transport.commands_run().is_empty());
    }
}
