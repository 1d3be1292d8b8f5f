use anyhow::Context;
use ibmi_bridge::shell::DEFAULT_COMMAND_TIMEOUT;
use ibmi_bridge::xmlservice::DEFAULT_RPC_TIMEOUT;
use ibmi_bridge::{ShellRunner, Transport, XmlserviceBridge};
use ibmi_jobs::duration::{parse_duration, to_wait};
use ibmi_protocol::DEFAULT_BRIDGE_ADDR;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RunnerConfig {
    pub(crate) bridge: Option<BridgeConfig>,
    pub(crate) shell: Option<ShellConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct BridgeConfig {
    pub(crate) addr: Option<String>,
    pub(crate) rpc_timeout: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShellConfig {
    pub(crate) command: String,
    pub(crate) command_timeout: Option<String>,
}

pub(crate) fn load_runner_config(path: &Path) -> anyhow::Result<RunnerConfig> {
    if !path.exists() {
        return Ok(RunnerConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: RunnerConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    validate_runner_config(&config)?;
    Ok(config)
}

fn validate_runner_config(config: &RunnerConfig) -> anyhow::Result<()> {
    if config.bridge.is_some() && config.shell.is_some() {
        anyhow::bail!("config must set either [bridge] or [shell], not both");
    }
    if let Some(bridge) = &config.bridge {
        if let Some(raw) = &bridge.rpc_timeout {
            configured_timeout(raw, "bridge.rpc_timeout")?;
        }
    }
    if let Some(shell) = &config.shell {
        if shell.command.trim().is_empty() {
            anyhow::bail!("shell.command cannot be empty");
        }
        if let Some(raw) = &shell.command_timeout {
            configured_timeout(raw, "shell.command_timeout")?;
        }
    }
    Ok(())
}

// Config timeouts fail loudly on bad input, unlike the task wait-time
// options that historically fall back to zero.
fn configured_timeout(raw: &str, label: &str) -> anyhow::Result<Duration> {
    match parse_duration(raw) {
        Some(seconds) => Ok(to_wait(seconds)),
        None => anyhow::bail!("{label} is not a valid duration: {raw}"),
    }
}

pub(crate) async fn build_transport(
    config: &RunnerConfig,
) -> anyhow::Result<Box<dyn Transport>> {
    if let Some(shell) = &config.shell {
        let timeout = match &shell.command_timeout {
            Some(raw) => configured_timeout(raw, "shell.command_timeout")?,
            None => DEFAULT_COMMAND_TIMEOUT,
        };
        let runner = ShellRunner::new(&shell.command, timeout)?;
        return Ok(Box::new(runner));
    }
    let bridge_config = config.bridge.as_ref();
    let addr = bridge_config
        .and_then(|bridge| bridge.addr.as_deref())
        .unwrap_or(DEFAULT_BRIDGE_ADDR);
    let rpc_timeout = match bridge_config.and_then(|bridge| bridge.rpc_timeout.as_ref()) {
        Some(raw) => configured_timeout(raw, "bridge.rpc_timeout")?,
        None => DEFAULT_RPC_TIMEOUT,
    };
    let bridge = XmlserviceBridge::connect(addr)
        .await
        .context("bridge gateway is required before any task work begins")?;
    Ok(Box::new(bridge.rpc_timeout(rpc_timeout)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults_to_bridge() {
        let config: RunnerConfig = toml::from_str("").unwrap();
        assert!(config.bridge.is_none());
        assert!(config.shell.is_none());
        assert!(validate_runner_config(&config).is_ok());
    }

    #[test]
    fn config_rejects_both_transports() {
        let input = r#"
[bridge]
addr = "127.0.0.1:47825"

[shell]
command = "system"
"#;
        let config: RunnerConfig = toml::from_str(input).unwrap();
        assert!(validate_runner_config(&config).is_err());
    }

    #[test]
    fn config_rejects_bad_timeout() {
        let input = r#"
[bridge]
rpc_timeout = "soon"
"#;
        let config: RunnerConfig = toml::from_str(input).unwrap();
        assert!(validate_runner_config(&config).is_err());
    }

    #[test]
    fn config_accepts_suffixed_timeout() {
        let input = r#"
[shell]
command = "ssh prod-ibmi system"
command_timeout = "10m"
"#;
        let config: RunnerConfig = toml::from_str(input).unwrap();
        assert!(validate_runner_config(&config).is_ok());
    }
}
