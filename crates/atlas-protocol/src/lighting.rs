//! Lighting seam driven by the intensity commands.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[async_trait]
pub trait LightingRig: Send + Sync {
    async fn set_ambient_intensity(&self, intensity: f64);

    async fn set_directional_intensity(&self, intensity: f64);

    async fn levels(&self) -> LightLevels;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightLevels {
    pub ambient: f64,
    pub directional: f64,
}

impl Default for LightLevels {
    fn default() -> Self {
        Self {
            ambient: 0.4,
            directional: 1.0,
        }
    }
}

/// Stores the requested levels.
#[derive(Debug, Default)]
pub struct StoredLights(RwLock<LightLevels>);

impl StoredLights {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LightingRig for StoredLights {
    async fn set_ambient_intensity(&self, intensity: f64) {
        debug!(intensity, "ambient intensity");
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .ambient = intensity;
    }

    async fn set_directional_intensity(&self, intensity: f64) {
        debug!(intensity, "directional intensity");
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .directional = intensity;
    }

    async fn levels(&self) -> LightLevels {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }
}
