use serde::{Deserialize, Serialize};

use crate::color::PackedColor;

/// Partial update applied to every registered material.
///
/// Unset fields leave the corresponding material property untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<PackedColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl MaterialPatch {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.emissive_intensity.is_none() && self.opacity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch() {
        assert!(MaterialPatch::default().is_empty());
    }

    #[test]
    fn deserializes_camel_case() {
        let patch: MaterialPatch =
            serde_json::from_str(r#"{"emissiveIntensity": 0.5, "opacity": 0.25}"#).unwrap();
        assert_eq!(patch.emissive_intensity, Some(0.5));
        assert_eq!(patch.opacity, Some(0.25));
        assert!(patch.color.is_none());
        assert!(!patch.is_empty());
    }
}
