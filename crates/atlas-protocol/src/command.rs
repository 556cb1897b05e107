//! The operation table.
//!
//! Each action (the envelope type with the namespace prefix removed) maps to
//! one [`Command`] variant with a typed, camelCase payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_types::{MaterialPatch, ModelId, PackedColor, Placement, Vec3};

use crate::camera::DEFAULT_VIEW_DURATION_MS;
use crate::error::{ProtocolError, ProtocolResult};

fn default_duration() -> u64 {
    DEFAULT_VIEW_DURATION_MS
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadModel {
    pub cdn_url: String,
    pub model_id: ModelId,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadArchive {
    pub archive_url: String,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVisibility {
    pub model_id: ModelId,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRef {
    pub model_id: ModelId,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetView {
    pub view_name: String,
    #[serde(default = "default_duration")]
    pub duration: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomView {
    pub position: Vec3,
    pub target: Vec3,
    #[serde(default = "default_duration")]
    pub duration: u64,
}

/// A color given as a packed integer or as `#rrggbb` text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Packed(u32),
    Text(String),
}

impl ColorValue {
    pub fn to_color(&self) -> ProtocolResult<PackedColor> {
        let parsed = match self {
            Self::Packed(v) => PackedColor::new(*v),
            Self::Text(s) => PackedColor::parse_hex(s),
        };
        parsed.map_err(|e| ProtocolError::InvalidPayload {
            action: "update_material",
            reason: e.to_string(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUpdate {
    #[serde(default)]
    pub color: Option<ColorValue>,
    #[serde(default)]
    pub emissive_intensity: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

impl MaterialUpdate {
    pub fn to_patch(&self) -> ProtocolResult<MaterialPatch> {
        Ok(MaterialPatch {
            color: self.color.as_ref().map(ColorValue::to_color).transpose()?,
            emissive_intensity: self.emissive_intensity,
            opacity: self.opacity,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Intensity {
    pub intensity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    LoadModel(LoadModel),
    LoadArchive(LoadArchive),
    SetModelVisibility(SetVisibility),
    RemoveModel(ModelRef),
    GetModels,
    GetLoadingStatus,
    SetView(SetView),
    SetCustomView(CustomView),
    GetCameraState,
    UpdateMaterial(MaterialPatch),
    SetAmbientIntensity(Intensity),
    SetDirectionalIntensity(Intensity),
}

impl Command {
    pub const ACTIONS: [&'static str; 12] = [
        "load_model",
        "load_archive",
        "set_model_visibility",
        "remove_model",
        "get_models",
        "get_loading_status",
        "set_view",
        "set_custom_view",
        "get_camera_state",
        "update_material",
        "set_ambient_intensity",
        "set_directional_intensity",
    ];

    /// Decode `payload` for `action`.
    pub fn parse(action: &str, payload: Value) -> ProtocolResult<Self> {
        Ok(match action {
            "load_model" => Self::LoadModel(decode("load_model", payload)?),
            "load_archive" => Self::LoadArchive(decode("load_archive", payload)?),
            "set_model_visibility" => {
                Self::SetModelVisibility(decode("set_model_visibility", payload)?)
            }
            "remove_model" => Self::RemoveModel(decode("remove_model", payload)?),
            "get_models" => Self::GetModels,
            "get_loading_status" => Self::GetLoadingStatus,
            "set_view" => Self::SetView(decode("set_view", payload)?),
            "set_custom_view" => Self::SetCustomView(decode("set_custom_view", payload)?),
            "get_camera_state" => Self::GetCameraState,
            "update_material" => {
                let update: MaterialUpdate = match payload {
                    Value::Null => MaterialUpdate::default(),
                    other => decode("update_material", other)?,
                };
                Self::UpdateMaterial(update.to_patch()?)
            }
            "set_ambient_intensity" => {
                Self::SetAmbientIntensity(decode("set_ambient_intensity", payload)?)
            }
            "set_directional_intensity" => {
                Self::SetDirectionalIntensity(decode("set_directional_intensity", payload)?)
            }
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        })
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::LoadModel(_) => "load_model",
            Self::LoadArchive(_) => "load_archive",
            Self::SetModelVisibility(_) => "set_model_visibility",
            Self::RemoveModel(_) => "remove_model",
            Self::GetModels => "get_models",
            Self::GetLoadingStatus => "get_loading_status",
            Self::SetView(_) => "set_view",
            Self::SetCustomView(_) => "set_custom_view",
            Self::GetCameraState => "get_camera_state",
            Self::UpdateMaterial(_) => "update_material",
            Self::SetAmbientIntensity(_) => "set_ambient_intensity",
            Self::SetDirectionalIntensity(_) => "set_directional_intensity",
        }
    }
}

fn decode<T: DeserializeOwned>(action: &'static str, payload: Value) -> ProtocolResult<T> {
    serde_json::from_value(payload).map_err(|e| ProtocolError::InvalidPayload {
        action,
        reason: e.to_string(),
    })
}

/// Placement from optional payload fields. Missing parts keep their defaults.
pub fn placement_of(position: Option<Vec3>, scale: Option<Vec3>) -> Placement {
    let base = Placement::default();
    Placement {
        position: position.unwrap_or(base.position),
        scale: scale.unwrap_or(base.scale),
    }
}
