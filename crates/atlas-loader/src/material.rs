//! Materials and the template new parts are dressed with.
//!
//! A [`MaterialHandle`] is shared between the part that renders with it and
//! the registry that retargets it in bulk. Releasing a handle marks it dead;
//! later updates are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use atlas_types::{MaterialPatch, PackedColor};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique material identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mat:{}", self.0)
    }
}

/// Surface properties of one material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: PackedColor,
    pub emissive: PackedColor,
    pub emissive_intensity: f64,
    pub roughness: f64,
    pub metalness: f64,
    pub opacity: f64,
    pub transparent: bool,
    pub double_sided: bool,
}

impl Material {
    /// Apply the set fields of `patch`. Opacity below 1 turns transparency on.
    pub fn apply(&mut self, patch: &MaterialPatch) {
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(intensity) = patch.emissive_intensity {
            self.emissive_intensity = intensity;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity;
            self.transparent = opacity < 1.0;
        }
    }
}

struct MaterialCell {
    id: MaterialId,
    state: RwLock<Material>,
    released: AtomicBool,
}

/// Shared, releasable handle to a [`Material`].
#[derive(Clone)]
pub struct MaterialHandle(Arc<MaterialCell>);

impl MaterialHandle {
    pub fn new(material: Material) -> Self {
        Self(Arc::new(MaterialCell {
            id: MaterialId::next(),
            state: RwLock::new(material),
            released: AtomicBool::new(false),
        }))
    }

    pub fn id(&self) -> MaterialId {
        self.0.id
    }

    /// Copy of the current properties.
    pub fn snapshot(&self) -> Material {
        self.0
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a patch. Returns `false` (and changes nothing) once released.
    pub fn apply(&self, patch: &MaterialPatch) -> bool {
        if self.is_released() {
            return false;
        }
        self.0
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(patch);
        true
    }

    /// Release the material. Returns `true` on the first call only.
    pub fn release(&self) -> bool {
        !self.0.released.swap(true, Ordering::AcqRel)
    }

    pub fn is_released(&self) -> bool {
        self.0.released.load(Ordering::Acquire)
    }

    /// Whether both handles point at the same material.
    pub fn same_as(&self, other: &MaterialHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MaterialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialHandle")
            .field("id", &self.0.id)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Materials created for one asset, keyed by the part they were assigned to.
pub type MaterialSet = BTreeMap<String, MaterialHandle>;

/// Recipe for the material every renderable part receives on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTemplate {
    /// Used when a load request carries no color override.
    pub default_color: PackedColor,
    pub roughness: f64,
    pub metalness: f64,
    pub opacity: f64,
    pub double_sided: bool,
}

impl Default for MaterialTemplate {
    fn default() -> Self {
        Self {
            default_color: PackedColor::WHITE,
            roughness: 0.5,
            metalness: 0.1,
            opacity: 0.9,
            double_sided: true,
        }
    }
}

impl MaterialTemplate {
    pub fn build(&self, color: Option<PackedColor>) -> Material {
        Material {
            color: color.unwrap_or(self.default_color),
            emissive: PackedColor::BLACK,
            emissive_intensity: 0.0,
            roughness: self.roughness,
            metalness: self.metalness,
            opacity: self.opacity,
            transparent: self.opacity < 1.0,
            double_sided: self.double_sided,
        }
    }

    /// Build a fresh, unshared material handle.
    pub fn instantiate(&self, color: Option<PackedColor>) -> MaterialHandle {
        MaterialHandle::new(self.build(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_defaults() {
        let m = MaterialTemplate::default().build(None);
        assert_eq!(m.color, PackedColor::WHITE);
        assert_eq!(m.opacity, 0.9);
        assert!(m.transparent);
        assert!(m.double_sided);
        assert_eq!(m.roughness, 0.5);
        assert_eq!(m.metalness, 0.1);
    }

    #[test]
    fn template_color_override() {
        let red = PackedColor::from_rgb(255, 0, 0);
        assert_eq!(MaterialTemplate::default().build(Some(red)).color, red);
    }

    #[test]
    fn instances_are_distinct() {
        let t = MaterialTemplate::default();
        let a = t.instantiate(None);
        let b = t.instantiate(None);
        assert_ne!(a.id(), b.id());
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a.clone()));
    }

    #[test]
    fn patch_opacity_toggles_transparency() {
        let h = MaterialTemplate::default().instantiate(None);
        h.apply(&MaterialPatch {
            opacity: Some(1.0),
            ..MaterialPatch::default()
        });
        assert!(!h.snapshot().transparent);
        h.apply(&MaterialPatch {
            opacity: Some(0.3),
            emissive_intensity: Some(2.0),
            ..MaterialPatch::default()
        });
        let m = h.snapshot();
        assert!(m.transparent);
        assert_eq!(m.emissive_intensity, 2.0);
    }

    #[test]
    fn released_handles_ignore_updates() {
        let h = MaterialTemplate::default().instantiate(None);
        assert!(h.release());
        assert!(!h.release());
        assert!(!h.apply(&MaterialPatch {
            color: Some(PackedColor::BLACK),
            ..MaterialPatch::default()
        }));
        assert_eq!(h.snapshot().color, PackedColor::WHITE);
    }
}
