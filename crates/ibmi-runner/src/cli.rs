use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ibmi-runner", version, about = "IBM i task runner over the XMLSERVICE bridge")]
pub(crate) struct Args {
    /// Bridge/runner configuration; defaults apply when the file is absent.
    #[arg(long, default_value = "config/ibmi-ops.toml")]
    pub(crate) config: PathBuf,
    /// JSON parameter document; stdin when omitted.
    #[arg(long)]
    pub(crate) params: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) module: ModuleCommand,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub(crate) enum ModuleCommand {
    /// Submit a batch job and optionally wait for a status.
    SubmitJob,
    /// Order a PTF with SNDPTFORD and wait for delivery.
    DownloadFix,
    /// Run a single CL command.
    ClCommand,
    /// Run a single SQL statement and return its rows.
    SqlQuery,
    /// Vary configuration objects on or off.
    DeviceVary,
    /// Grant or revoke object authority.
    ObjectAuthority,
    /// Save objects into a save file.
    ObjectSave,
    /// Restore objects from a save file.
    ObjectRestore,
    /// Provision or tear down the network install server resources.
    NetworkInstall,
}
