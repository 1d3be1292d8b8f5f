use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_cl::{Grtobjaut, Rvkobjaut};
use ibmi_protocol::{TaskOutcome, RC_PARAM_NOT_VALID};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Operation {
    Grant,
    Revoke,
    GrantAutl,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) operation: Operation,
    pub(crate) object_name: String,
    #[serde(default = "default_library")]
    pub(crate) object_library: String,
    pub(crate) object_type: String,
    #[serde(default = "default_asp_device")]
    pub(crate) asp_device: String,
    #[serde(default)]
    pub(crate) user: Vec<String>,
    #[serde(default = "default_authority")]
    pub(crate) authority: Vec<String>,
    #[serde(default)]
    pub(crate) replace_authority: bool,
    #[serde(default)]
    pub(crate) authorization_list: String,
    #[serde(default)]
    pub(crate) joblog: bool,
}

fn default_library() -> String {
    "*LIBL".to_string()
}

fn default_asp_device() -> String {
    "*".to_string()
}

fn default_authority() -> Vec<String> {
    vec!["*CHANGE".to_string()]
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let rendered = match params.operation {
        Operation::Grant => Grtobjaut::to_users(
            &params.object_library,
            &params.object_name,
            &params.object_type,
            params.user.clone(),
            params.authority.clone(),
        )
        .asp_device(&params.asp_device)
        .replace(params.replace_authority)
        .render(),
        Operation::Revoke => Rvkobjaut::new(
            &params.object_library,
            &params.object_name,
            &params.object_type,
            params.user.clone(),
            params.authority.clone(),
        )
        .asp_device(&params.asp_device)
        .render(),
        Operation::GrantAutl => Grtobjaut::with_authorization_list(
            &params.object_library,
            &params.object_name,
            &params.object_type,
            &params.authorization_list,
        )
        .asp_device(&params.asp_device)
        .render(),
    };
    let command = match rendered {
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
        TaskOutcome::failure(output.rc, format!("Change authority failed: {command}"))
    };
    Ok(base
        .with_streams(output.stdout, output.stderr)
        .with_job_log(job_log)
        .with_field("cmd", command)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}
