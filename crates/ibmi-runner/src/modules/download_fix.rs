use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_cl::{Sbmjob, Sndptford};
use ibmi_jobs::duration::{parse_duration_or_zero, to_wait};
use ibmi_jobs::handle::find_submitted_job;
use ibmi_jobs::poller::{wait_for_status, PollOrder, PollSpec};
use ibmi_protocol::{JobStatus, TaskOutcome, RC_ERROR, RC_PARAM_NOT_VALID, RC_UNEXPECTED};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) ptf_id: String,
    #[serde(default = "default_product")]
    pub(crate) product: String,
    #[serde(default = "default_release")]
    pub(crate) release: String,
    #[serde(default = "default_delivery_format")]
    pub(crate) delivery_format: String,
    #[serde(default = "default_order")]
    pub(crate) order: String,
    #[serde(default = "default_true")]
    pub(crate) reorder: bool,
    #[serde(default)]
    pub(crate) check_ptf: bool,
    #[serde(default = "default_image_directory")]
    pub(crate) image_directory: String,
    #[serde(default = "default_time_out")]
    pub(crate) time_out: String,
    #[serde(default = "default_true")]
    pub(crate) wait: bool,
    #[serde(default)]
    pub(crate) parameters: String,
}

fn default_product() -> String {
    "*ONLYPRD".to_string()
}

fn default_release() -> String {
    "*ONLYRLS".to_string()
}

fn default_delivery_format() -> String {
    "*SAVF".to_string()
}

fn default_order() -> String {
    "*REQUIRED".to_string()
}

fn default_image_directory() -> String {
    "*DFT".to_string()
}

fn default_time_out() -> String {
    "15m".to_string()
}

fn default_true() -> bool {
    true
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let sndptford = Sndptford::new(&params.ptf_id)
        .product(&params.product)
        .release(&params.release)
        .delivery_format(&params.delivery_format)
        .order(&params.order)
        .reorder(params.reorder)
        .check_ptf(params.check_ptf)
        .image_directory(&params.image_directory)
        .parameters(&params.parameters);
    let inner = match sndptford.render() {
        Ok(command) => command,
        Err(err) => return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, err.to_string())),
    };
    // the order job logs everything so the PTF list can be read back
    let sbmjob_cmd = Sbmjob::new(&inner)
        .parameters("LOG(4 *JOBD *SECLVL) LOGOUTPUT(*PND)")
        .render()
        .map_err(|err| anyhow::anyhow!(err))?;

    let clock = TaskClock::start();
    let output = transport.run_command(&sbmjob_cmd).await?;
    let submit_log = transport
        .job_log_since(None, Some(&clock.start_stamp()))
        .await?;

    if !output.succeeded() {
        return Ok(TaskOutcome::failure(output.rc, "Submit job failed.")
            .with_streams(output.stdout, output.stderr)
            .with_job_log(submit_log)
            .with_field("sndptford_cmd", sbmjob_cmd));
    }

    let handle = match find_submitted_job(&submit_log) {
        Some(handle) => handle,
        None => {
            return Ok(TaskOutcome::failure(
                RC_UNEXPECTED,
                "cannot find the SNDPTFORD job in the job log",
            )
            .with_job_log(submit_log)
            .with_field("sndptford_cmd", sbmjob_cmd));
        }
    };

    if params.wait || params.delivery_format == "*IMAGE" {
        let spec = PollSpec {
            accept: vec![JobStatus::OutQueue, JobStatus::Unknown],
            interval: Duration::from_secs(1),
            timeout: to_wait(parse_duration_or_zero(&params.time_out)),
            order: PollOrder::SleepThenQuery,
        };
        let poll = wait_for_status(transport, &handle, &spec).await?;
        if !poll.accepted_by(&spec) {
            let order_log = transport.job_log_since(Some(&handle), None).await?;
            return Ok(TaskOutcome::failure(
                RC_ERROR,
                "Time up when waiting for SNDPTFORD complete.",
            )
            .with_job_log(order_log)
            .with_field("job_submitted", handle.to_string())
            .with_field("sndptford_cmd", sbmjob_cmd)
            .with_field("start", clock.start_stamp())
            .with_field("end", clock.end_stamp())
            .with_field("delta", clock.delta()));
        }
    }

    let order_log = if params.wait || params.delivery_format == "*IMAGE" {
        transport.job_log_since(Some(&handle), None).await?
    } else {
        Vec::new()
    };

    Ok(TaskOutcome::success(output.rc)
        .with_streams(output.stdout, output.stderr)
        .with_job_log(order_log)
        .with_field("job_submitted", handle.to_string())
        .with_field("sndptford_cmd", sbmjob_cmd)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibmi_bridge::testing::ScriptedTransport;
    use ibmi_protocol::JobLogEntry;
    use serde_json::json;

    fn submit_log() -> Vec<JobLogEntry> {
        vec![JobLogEntry {
            message_id: "CPC1221".to_string(),
            message_text: "Job 654321/QSECOFR/QDFTJOBD submitted to job queue QBATCH.".to_string(),
            ..JobLogEntry::default()
        }]
    }

    fn params(raw: &str) -> Params {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn builds_sbmjob_wrapped_order_and_waits_for_outq() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(submit_log());
        transport.push_sql_rows(vec![json!({"job_status": "*ACTIVE"})]);
        transport.push_sql_rows(vec![json!({"job_status": "*OUTQ"})]);
        let outcome = run(
            &transport,
            params(r#"{"ptf_id": "SI63556", "order": "*PTFID", "time_out": "1m"}"#),
        )
        .await
        .unwrap();
        assert!(!outcome.failed);
        let command = outcome.extra["sndptford_cmd"].as_str().unwrap();
        assert!(command.starts_with("QSYS/SBMJOB CMD(SNDPTFORD PTFID((SI63556"));
        assert!(command.contains("LOG(4 *JOBD *SECLVL)"));
        assert_eq!(outcome.extra["job_submitted"], json!("654321/QSECOFR/QDFTJOBD"));
    }

    #[tokio::test]
    async fn timeout_reports_time_up() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(submit_log());
        transport.push_sql_rows(vec![json!({"job_status": "*ACTIVE"})]);
        let outcome = run(
            &transport,
            params(r#"{"ptf_id": "SI63556", "time_out": "0s"}"#),
        )
        .await
        .unwrap();
        assert!(outcome.failed);
        assert_eq!(
            outcome.msg.as_deref(),
            Some("Time up when waiting for SNDPTFORD complete.")
        );
    }

    #[tokio::test]
    async fn no_wait_savf_order_skips_polling() {
        let transport = ScriptedTransport::new();
        transport.set_job_log(submit_log());
        let outcome = run(
            &transport,
            params(r#"{"ptf_id": "SI63556", "wait": false}"#),
        )
        .await
        .unwrap();
        assert!(!outcome.failed);
        assert!(transport.sql_run().is_empty());
    }
}
