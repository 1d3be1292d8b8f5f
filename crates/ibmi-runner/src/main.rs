mod cli;
mod config;
mod modules;

use crate::cli::{Args, ModuleCommand};
use crate::config::{build_transport, load_runner_config};
use anyhow::Context;
use clap::Parser;
use ibmi_bridge::Transport;
use ibmi_protocol::{TaskOutcome, RC_PARAM_NOT_VALID, RC_UNEXPECTED};
use std::io::Read;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let config = load_runner_config(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    let transport = build_transport(&config).await?;

    let raw_params = read_params(args.params.as_deref())?;
    let outcome = dispatch(args.module, transport.as_ref(), &raw_params).await;

    // stdout carries exactly one JSON document; logs go to stderr
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if outcome.failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(module: ModuleCommand, transport: &dyn Transport, raw: &str) -> TaskOutcome {
    let result = match module {
        ModuleCommand::SubmitJob => run_module(raw, |params| modules::submit_job::run(transport, params)).await,
        ModuleCommand::DownloadFix => run_module(raw, |params| modules::download_fix::run(transport, params)).await,
        ModuleCommand::ClCommand => run_module(raw, |params| modules::cl_command::run(transport, params)).await,
        ModuleCommand::SqlQuery => run_module(raw, |params| modules::sql_query::run(transport, params)).await,
        ModuleCommand::DeviceVary => run_module(raw, |params| modules::device_vary::run(transport, params)).await,
        ModuleCommand::ObjectAuthority => {
            run_module(raw, |params| modules::object_authority::run(transport, params)).await
        }
        ModuleCommand::ObjectSave => run_module(raw, |params| modules::object_save::run(transport, params)).await,
        ModuleCommand::ObjectRestore => {
            run_module(raw, |params| modules::object_restore::run(transport, params)).await
        }
        ModuleCommand::NetworkInstall => {
            run_module(raw, |params| modules::network_install::run(transport, params)).await
        }
    };
    match result {
        Ok(outcome) => outcome,
        Err(err) => TaskOutcome::failure(RC_UNEXPECTED, format!("Exception occurred: {err:#}")),
    }
}

async fn run_module<P, F, Fut>(raw: &str, run: F) -> anyhow::Result<TaskOutcome>
where
    P: serde::de::DeserializeOwned,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<TaskOutcome>>,
{
    let params: P = match serde_json::from_str(raw) {
        Ok(params) => params,
        Err(err) => {
            return Ok(TaskOutcome::failure(
                RC_PARAM_NOT_VALID,
                format!("invalid parameters: {err}"),
            ))
        }
    };
    run(params).await
}

fn read_params(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read params {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read params from stdin")?;
            Ok(raw)
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
