use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_cl::Rstobj;
use ibmi_protocol::{TaskOutcome, RC_PARAM_NOT_VALID};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    #[serde(default = "default_all")]
    pub(crate) object_names: String,
    pub(crate) object_lib: String,
    #[serde(default = "default_all")]
    pub(crate) object_types: String,
    pub(crate) savefile_name: String,
    pub(crate) savefile_lib: String,
    #[serde(default)]
    pub(crate) joblog: bool,
    #[serde(default)]
    pub(crate) parameters: String,
}

fn default_all() -> String {
    "*ALL".to_string()
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let objects: Vec<String> = params
        .object_names
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let command = match Rstobj::new(&params.object_lib, &params.savefile_lib, &params.savefile_name)
        .objects(objects)
        .object_types(&params.object_types)
        .parameters(&params.parameters)
        .render()
    {
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
        TaskOutcome::failure(output.rc, format!("Restore failed: {command}"))
    };
    Ok(base
        .with_streams(output.stdout, output.stderr)
        .with_job_log(job_log)
        .with_field("cmd", command)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}
