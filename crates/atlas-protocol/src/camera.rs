//! Camera seam driven by the view commands.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use atlas_types::Vec3;

pub const DEFAULT_VIEW_DURATION_MS: u64 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f64,
}

/// Named camera placements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreset {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
    Isometric,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 7] = [
        Self::Front,
        Self::Back,
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::Isometric,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Isometric => "isometric",
        }
    }

    /// Camera position for the preset. Every preset looks at the origin.
    pub fn position(&self) -> Vec3 {
        match self {
            Self::Front => Vec3::new(0.0, 0.0, 20.0),
            Self::Back => Vec3::new(0.0, 0.0, -20.0),
            Self::Left => Vec3::new(-20.0, 0.0, 0.0),
            Self::Right => Vec3::new(20.0, 0.0, 0.0),
            Self::Top => Vec3::new(0.0, 20.0, 0.0),
            Self::Bottom => Vec3::new(0.0, -20.0, 0.0),
            Self::Isometric => Vec3::splat(15.0),
        }
    }
}

#[async_trait]
pub trait CameraRig: Send + Sync {
    /// Move to a named preset. Returns `false` for an unknown name.
    async fn set_view(&self, name: &str, duration_ms: u64) -> bool;

    async fn set_custom_view(&self, position: Vec3, target: Vec3, duration_ms: u64);

    async fn camera_state(&self) -> CameraState;
}

/// Camera that jumps straight to its destination.
#[derive(Debug)]
pub struct PresetCamera {
    state: RwLock<CameraState>,
}

impl PresetCamera {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CameraState {
                position: Vec3::splat(10.0),
                target: Vec3::ZERO,
                zoom: 1.0,
            }),
        }
    }

    fn move_to(&self, position: Vec3, target: Vec3) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.position = position;
        state.target = target;
    }
}

impl Default for PresetCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraRig for PresetCamera {
    async fn set_view(&self, name: &str, duration_ms: u64) -> bool {
        let Some(preset) = ViewPreset::parse(name) else {
            warn!(view = name, "unknown view preset");
            return false;
        };
        debug!(view = name, duration_ms, "camera preset");
        self.move_to(preset.position(), Vec3::ZERO);
        true
    }

    async fn set_custom_view(&self, position: Vec3, target: Vec3, duration_ms: u64) {
        debug!(?position, ?target, duration_ms, "camera custom view");
        self.move_to(position, target);
    }

    async fn camera_state(&self) -> CameraState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_at_initial_position() {
        let cam = PresetCamera::new();
        let state = cam.camera_state().await;
        assert_eq!(state.position, Vec3::splat(10.0));
        assert_eq!(state.target, Vec3::ZERO);
        assert_eq!(state.zoom, 1.0);
    }

    #[tokio::test]
    async fn presets_move_the_camera() {
        let cam = PresetCamera::new();
        assert!(cam.set_view("left", 500).await);
        assert_eq!(cam.camera_state().await.position, Vec3::new(-20.0, 0.0, 0.0));
        assert!(cam.set_view("isometric", 0).await);
        assert_eq!(cam.camera_state().await.position, Vec3::splat(15.0));
    }

    #[tokio::test]
    async fn unknown_preset_leaves_camera_alone() {
        let cam = PresetCamera::new();
        assert!(!cam.set_view("sideways", 100).await);
        assert_eq!(cam.camera_state().await.position, Vec3::splat(10.0));
    }

    #[tokio::test]
    async fn custom_view_sets_target() {
        let cam = PresetCamera::new();
        cam.set_custom_view(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 1.0, 0.0), 10)
            .await;
        let state = cam.camera_state().await;
        assert_eq!(state.target, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in ViewPreset::ALL {
            assert_eq!(ViewPreset::parse(preset.as_str()), Some(preset));
        }
    }
}
