use crate::modules::TaskClock;
use ibmi_bridge::Transport;
use ibmi_cl::{Clrsavf, Crtsavf, Savobj};
use ibmi_protocol::{TaskOutcome, RC_PARAM_NOT_VALID};
use ibmi_sequence::{SequencePlan, StepRecovery};
use serde::Deserialize;

const SAVF_EXISTS: &str = "CPF5813";

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
    pub(crate) force_save: bool,
    #[serde(default = "default_release")]
    pub(crate) target_release: String,
    #[serde(default)]
    pub(crate) joblog: bool,
    #[serde(default)]
    pub(crate) parameters: String,
}

fn default_all() -> String {
    "*ALL".to_string()
}

fn default_release() -> String {
    "*CURRENT".to_string()
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let objects: Vec<String> = params
        .object_names
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let rendered = (|| -> anyhow::Result<(String, String, String)> {
        let create = Crtsavf::new(&params.savefile_lib, &params.savefile_name).render()?;
        let clear = Clrsavf::new(&params.savefile_lib, &params.savefile_name).render()?;
        let save = Savobj::new(&params.object_lib, &params.savefile_lib, &params.savefile_name)
            .objects(objects)
            .object_types(&params.object_types)
            .target_release(&params.target_release)
            .parameters(&params.parameters)
            .render()?;
        Ok((create, clear, save))
    })();
    let (create, clear, save) = match rendered {
        Ok(commands) => commands,
        Err(err) => return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, err.to_string())),
    };

    let mut plan = SequencePlan::new("Command log of save operation.");
    if params.force_save {
        // an existing save file is cleared and reused
        plan = plan.step_with_recovery(
            "create_savefile",
            create,
            &[],
            StepRecovery {
                message_id: SAVF_EXISTS.to_string(),
                command: clear,
            },
        );
    } else {
        plan = plan.step("create_savefile", create, &[]);
    }
    plan = plan.step("save_objects", save, &[]);

    let clock = TaskClock::start();
    let report = plan.execute(transport, false).await?;

    let job_log = if params.joblog || report.failure.is_some() {
        transport
            .job_log_since(None, Some(&clock.start_stamp()))
            .await?
    } else {
        Vec::new()
    };

    let base = match &report.failure {
        None => TaskOutcome::success(0),
        Some(failure) => {
            let msg = if failure.step == "create_savefile"
                && !params.force_save
                && mentions(failure, SAVF_EXISTS)
            {
                format!(
                    "File {} in library {} already exists. Set force_save to force save.",
                    params.savefile_name.to_uppercase(),
                    params.savefile_lib.to_uppercase()
                )
            } else {
                format!("Save failed at step {}.", failure.step)
            };
            TaskOutcome::failure(failure.rc, msg)
                .with_streams(failure.stdout.clone(), failure.stderr.clone())
        }
    };
    Ok(base
        .with_job_log(job_log)
        .with_field("command_log", report.log.render())
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}

fn mentions(failure: &ibmi_sequence::SequenceFailure, message_id: &str) -> bool {
    failure.stderr.contains(message_id)
        || failure
            .job_log
            .iter()
            .any(|entry| entry.message_id == message_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibmi_bridge::testing::ScriptedTransport;
    use ibmi_protocol::RC_ERROR;

    fn params(raw: &str) -> Params {
        serde_json::from_str(raw).unwrap()
    }

    fn base_params() -> Params {
        params(
            r#"{"object_lib": "TESTLIB", "savefile_name": "ARCHIVE",
                "savefile_lib": "ARCHLIB"}"#,
        )
    }

    #[tokio::test]
    async fn fresh_save_creates_then_saves() {
        let transport = ScriptedTransport::new();
        let outcome = run(&transport, base_params()).await.unwrap();
        assert!(!outcome.failed);
        let commands = transport.commands_run();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], "QSYS/CRTSAVF FILE(ARCHLIB/ARCHIVE)");
        assert!(commands[1].starts_with("QSYS/SAVOBJ OBJ(*ALL) LIB(TESTLIB)"));
    }

    #[tokio::test]
    async fn existing_savefile_without_force_is_an_error() {
        let transport = ScriptedTransport::new();
        transport.fail_command("CRTSAVF", RC_ERROR, "CPF5813: File ARCHIVE already exists.");
        let outcome = run(&transport, base_params()).await.unwrap();
        assert!(outcome.failed);
        assert_eq!(
            outcome.msg.as_deref(),
            Some("File ARCHIVE in library ARCHLIB already exists. Set force_save to force save.")
        );
        // the save step never ran
        assert_eq!(transport.commands_run().len(), 1);
    }

    #[tokio::test]
    async fn force_save_clears_and_retries_on_cpf5813() {
        let transport = ScriptedTransport::new();
        transport.fail_command_once("CRTSAVF", RC_ERROR, "CPF5813: File ARCHIVE already exists.");
        let mut p = base_params();
        p.force_save = true;
        let outcome = run(&transport, p).await.unwrap();
        assert!(!outcome.failed);
        let commands = transport.commands_run();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1], "QSYS/CLRSAVF FILE(ARCHLIB/ARCHIVE)");
        assert!(commands[2].starts_with("QSYS/SAVOBJ"));
    }

    #[tokio::test]
    async fn object_list_and_types_flow_into_savobj() {
        let transport = ScriptedTransport::new();
        let mut p = base_params();
        p.object_names = "PGMA PGMB".to_string();
        p.object_types = "*PGM".to_string();
        p.target_release = "V7R2M0".to_string();
        let outcome = run(&transport, p).await.unwrap();
        assert!(!outcome.failed);
        let save = &transport.commands_run()[1];
        assert!(save.contains("OBJ(PGMA PGMB)"));
        assert!(save.contains("OBJTYPE(*PGM)"));
        assert!(save.contains("TGTRLS(V7R2M0)"));
    }

    #[tokio::test]
    async fn invalid_savefile_name_fails_before_any_remote_call() {
        let transport = ScriptedTransport::new();
        let mut p = base_params();
        p.savefile_name = "WAY_TOO_LONG_NAME".to_string();
        let outcome = run(&transport, p).await.unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.rc, RC_PARAM_NOT_VALID);
        assert!(transport.commands_run().is_empty());
    }
}
