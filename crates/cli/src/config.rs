use anyhow::{Context, Result};
use engage_video_session_core::{Config as SessionConfig, SilentStopPolicy};
use serde::Deserialize;
use std::path::Path;

/// Driver configuration, loaded from an optional TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub session: SessionConfig,
    pub ports: PortsConfig,
}

/// Behaviour of the simulated collaborator ports
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// Latency added to every asynchronous port call
    pub delay_ms: u64,
    /// Ports that fail every call, by name (e.g. "stop_video_session")
    pub fail: Vec<String>,
}

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port_delay_ms: Option<u64>,
    /// Appended to the file's failing ports
    pub fail_ports: Vec<String>,
    pub silent_stop: Option<SilentStopPolicy>,
}

pub const PORT_NAMES: [&str; 3] = [
    "initialize_messenger",
    "send_start_video_session_message",
    "stop_video_session",
];

impl CliConfig {
    /// Load the optional file, apply the overrides and validate the result
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(delay) = overrides.port_delay_ms {
            config.ports.delay_ms = delay;
        }
        config.ports.fail.extend(overrides.fail_ports);
        if let Some(policy) = overrides.silent_stop {
            config.session.silent_stop = policy;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a config file. The result is not validated.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        for name in &self.ports.fail {
            if !PORT_NAMES.contains(&name.as_str()) {
                anyhow::bail!("unknown port '{}' (expected one of {})", name, PORT_NAMES.join(", "));
            }
        }
        Ok(())
    }
}
