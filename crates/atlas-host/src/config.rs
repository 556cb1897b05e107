use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use atlas_pipeline::PipelineConfig;
use atlas_protocol::DEFAULT_NAMESPACE;

use crate::error::{HostError, HostResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub bind_addr: SocketAddr,
    /// Command type prefix, without the trailing underscore.
    pub namespace: String,
    /// Outbound lines buffered by the stdio writer.
    pub channel_capacity: usize,
    pub pipeline: PipelineConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8741)),
            namespace: DEFAULT_NAMESPACE.into(),
            channel_capacity: 256,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn from_toml(text: &str) -> HostResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> HostResult<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> HostResult<()> {
        if self.namespace.is_empty() || self.namespace.ends_with('_') {
            return Err(HostError::Config(format!(
                "namespace must be non-empty and not end with '_': {:?}",
                self.namespace
            )));
        }
        if self.channel_capacity == 0 {
            return Err(HostError::Config("channel_capacity must be positive".into()));
        }
        Ok(())
    }
}
