use crate::modules::TaskClock;
use ibmi_bridge::{object_exists, Transport};
use ibmi_cl::{Chgnfsexp, Crtdevopt, Crtimgclg, Dltdevd, Dltimgclg, Lodimgclg, Strnfssvr, Vrycfg};
use ibmi_protocol::{TaskOutcome, RC_PARAM_NOT_VALID};
use ibmi_sequence::{CommandLog, SequencePlan};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Operation {
    Setup,
    Uninstall,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) operation: Operation,
    #[serde(default = "default_catalog")]
    pub(crate) image_catalog_name: String,
    #[serde(default = "default_device")]
    pub(crate) virtual_opt_device: String,
    #[serde(default = "default_directory")]
    pub(crate) image_catalog_directory: String,
    #[serde(default)]
    pub(crate) remove_image_files: bool,
    #[serde(default = "default_true")]
    pub(crate) rollback: bool,
}

fn default_catalog() -> String {
    "REPOSVRCLG".to_string()
}

fn default_device() -> String {
    "REPOSVROPT".to_string()
}

fn default_directory() -> String {
    "/etc/ibmi_ansible/fix_management/network_install".to_string()
}

fn default_true() -> bool {
    true
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    match params.operation {
        Operation::Setup => setup(transport, &params).await,
        Operation::Uninstall => uninstall(transport, &params).await,
    }
}

/// Provision the device/catalog/NFS chain. Already-present resources are
/// skipped so a partially-built server can be finished in place.
async fn setup(transport: &dyn Transport, params: &Params) -> anyhow::Result<TaskOutcome> {
    let device = &params.virtual_opt_device;
    let catalog = &params.image_catalog_name;

    let rendered = (|| -> anyhow::Result<SetupCommands> {
        Ok(SetupCommands {
            create_device: Crtdevopt::new(device)
                .text("Optical device for PTF network install")
                .render()?,
            create_catalog: Crtimgclg::new(catalog, &params.image_catalog_directory).render()?,
            vary_on: Vrycfg::on(vec![device.clone()]).render()?,
            vary_off: Vrycfg::off(vec![device.clone()]).forced(true).render()?,
            delete_catalog: Dltimgclg::new(catalog, false).render()?,
            delete_device: Dltdevd::new(device).render()?,
            start_nfs: Strnfssvr.render(),
            export: Chgnfsexp::export_read_only(&params.image_catalog_directory).render()?,
        })
    })();
    let commands = match rendered {
        Ok(commands) => commands,
        Err(err) => return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, err.to_string())),
    };

    let device_exists = object_exists(transport, "QSYS", "*DEVD", device).await;
    let catalog_exists = object_exists(transport, "QUSRSYS", "*IMGCLG", catalog).await;

    let mut plan = SequencePlan::new("Command log of setup operation.")
        .command("cl_vary_off_device", commands.vary_off)
        .command("cl_delete_image_catalog", commands.delete_catalog)
        .command("cl_dlt_device", commands.delete_device);
    if !device_exists {
        plan = plan.step("cl_crt_device", commands.create_device, &["cl_dlt_device"]);
    }
    if !catalog_exists {
        plan = plan.step(
            "cl_crt_catalog",
            commands.create_catalog,
            &["cl_vary_off_device", "cl_delete_image_catalog", "cl_dlt_device"],
        );
    }
    plan = plan
        .step(
            "cl_vary_on_device",
            commands.vary_on,
            &["cl_vary_off_device", "cl_delete_image_catalog", "cl_dlt_device"],
        )
        .step("cl_start_NFS_service", commands.start_nfs, &[])
        .step("cl_export_catalog", commands.export, &[]);

    let clock = TaskClock::start();
    let report = plan.execute(transport, params.rollback).await?;

    let base = match &report.failure {
        None => TaskOutcome::success(0),
        Some(failure) => TaskOutcome::failure(
            failure.rc,
            format!("Setup failed at step {}.", failure.step),
        )
        .with_streams(failure.stdout.clone(), failure.stderr.clone())
        .with_job_log(failure.job_log.clone()),
    };
    Ok(base
        .with_field("command_log", report.log.render())
        .with_field("device", device.to_uppercase())
        .with_field("image_catalog", catalog.to_uppercase())
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}

struct SetupCommands {
    create_device: String,
    create_catalog: String,
    vary_on: String,
    vary_off: String,
    delete_catalog: String,
    delete_device: String,
    start_nfs: String,
    export: String,
}

/// Tear the chain down best-effort. Individual step failures are logged
/// and skipped; a half-removed server can be uninstalled again.
async fn uninstall(transport: &dyn Transport, params: &Params) -> anyhow::Result<TaskOutcome> {
    let device = &params.virtual_opt_device;
    let catalog = &params.image_catalog_name;

    let device_exists = object_exists(transport, "QSYS", "*DEVD", device).await;
    let catalog_exists = object_exists(transport, "QUSRSYS", "*IMGCLG", catalog).await;

    let clock = TaskClock::start();
    if !device_exists && !catalog_exists {
        return Ok(TaskOutcome::success(0)
            .with_streams("", "The optical device and image catalog do not exist")
            .with_field("command_log", String::new())
            .with_field("start", clock.start_stamp())
            .with_field("end", clock.end_stamp())
            .with_field("delta", clock.delta()));
    }

    let rendered = (|| -> anyhow::Result<Vec<String>> {
        let mut teardown = Vec::new();
        if catalog_exists {
            teardown.push(Lodimgclg::unload(catalog).render()?);
        }
        if device_exists {
            teardown.push(Vrycfg::off(vec![device.clone()]).render()?);
        }
        if catalog_exists {
            // KEEP(*YES) leaves the image files on disk for the next setup
            teardown.push(Dltimgclg::new(catalog, !params.remove_image_files).render()?);
        }
        if device_exists {
            teardown.push(Dltdevd::new(device).render()?);
        }
        Ok(teardown)
    })();
    let teardown = match rendered {
        Ok(teardown) => teardown,
        Err(err) => return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, err.to_string())),
    };

    let mut log = CommandLog::new("Command log of uninstall operation.");
    for command in &teardown {
        tracing::info!(command = %command, "running uninstall step");
        let output = transport.run_command(command).await?;
        log.push(command.clone(), output.stdout.clone());
        if !output.succeeded() {
            tracing::warn!(command = %command, rc = output.rc, "uninstall step failed, continuing");
        }
    }

    Ok(TaskOutcome::success(0)
        .with_field("command_log", log.render())
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}
