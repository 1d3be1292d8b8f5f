use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_cl::Vrycfg;
use ibmi_protocol::{TaskOutcome, RC_PARAM_NOT_VALID};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) device_list: Vec<String>,
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) extra_parameters: String,
    #[serde(default)]
    pub(crate) joblog: bool,
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let builder = match params.status.as_str() {
        "*ON" => Vrycfg::on(params.device_list.clone()),
        // vary off is always forced so busy devices still come down
        "*OFF" => Vrycfg::off(params.device_list.clone()).forced(true),
        other => {
            return Ok(TaskOutcome::failure(
                RC_PARAM_NOT_VALID,
                format!("Value {other} specified for status is not valid. Valid values are *ON, *OFF"),
            ));
        }
    };
    let command = match builder.extra_parameters(&params.extra_parameters).render() {
        Ok(command) => command,
        Err(err) => return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, err.to_string())),
    };

    let clock = TaskClock::start();
    let output = transport.run_command(&command).await?;

    let job_log = if params.joblog || !output.succeeded() {
        transport
            .job_log_since(None, Some(&clock.start_stamp()))
            .await?
    } else {
        Vec::new()
    };

    let base = if output.succeeded() {
        TaskOutcome::success(output.rc)
    } else {
        TaskOutcome::failure(output.rc, format!("Vary device failed: {command}"))
    };
    Ok(base
        .with_streams(output.stdout, output.stderr)
        .with_job_log(job_log)
        .with_field("cmd", command)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}
