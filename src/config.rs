use std::fs;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::command::{ControlMode, HandoverPolicy};
use crate::dynamics::body::BodyConfig;
use crate::dynamics::state::SimConfig;
use crate::error::ConfigError;
use crate::gnc::ControllerParameters;
use crate::telemetry::ImuConfig;

// ---------------------------------------------------------------------------
// JSON configuration for a flight session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { ip: "127.0.0.1".into(), port: 10000 }
    }
}

impl EndpointConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .ip
            .parse()
            .map_err(|_| ConfigError::Endpoint(format!("{}:{}", self.ip, self.port)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlightConfig {
    pub controller: ControllerParameters,
    pub sim: SimConfig,
    pub body: BodyConfig,
    /// Where remote velocity commands arrive.
    pub endpoint: EndpointConfig,
    /// IMU telemetry; `None` disables publishing.
    pub imu: Option<ImuTarget>,
    pub mode: ControlMode,
    pub handover: HandoverPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImuTarget {
    #[serde(flatten)]
    pub sensor: ImuConfig,
    pub target: EndpointConfig,
}

impl FlightConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.sim.validate()?;
        self.endpoint.socket_addr()?;
        if let Some(imu) = &self.imu {
            imu.sensor.validate()?;
            imu.target.socket_addr()?;
        }
        Ok(())
    }
}
