//! The adapter between raw bytes and a scene-ready object.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use atlas_types::{ModelId, PackedColor, Placement};

use crate::codec::{GltfCodec, SceneCodec};
use crate::error::LoaderResult;
use crate::material::{MaterialSet, MaterialTemplate};
use crate::scene::SceneObject;

/// What to load and how to dress it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub id: ModelId,
    /// Overrides the template's default color on every part.
    pub color: Option<PackedColor>,
    pub placement: Placement,
}

impl LoadRequest {
    pub fn new(id: impl Into<ModelId>) -> Self {
        Self {
            id: id.into(),
            color: None,
            placement: Placement::default(),
        }
    }

    pub fn with_color(mut self, color: PackedColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

/// A decoded asset and the materials created for it.
#[derive(Clone, Debug)]
pub struct LoadedAsset {
    pub object: SceneObject,
    pub materials: MaterialSet,
}

/// Decodes buffers and prepares them for the scene.
#[derive(Clone)]
pub struct AssetLoader {
    codec: Arc<dyn SceneCodec>,
    template: MaterialTemplate,
}

impl AssetLoader {
    pub fn new(codec: Arc<dyn SceneCodec>, template: MaterialTemplate) -> Self {
        Self { codec, template }
    }

    /// glTF codec with the default material template.
    pub fn gltf() -> Self {
        Self::new(Arc::new(GltfCodec), MaterialTemplate::default())
    }

    pub fn template(&self) -> &MaterialTemplate {
        &self.template
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    /// Decode `bytes` and give every part its own material, shadows on.
    ///
    /// On a decode failure nothing is created.
    pub fn load(&self, bytes: &[u8], request: &LoadRequest) -> LoaderResult<LoadedAsset> {
        let decoded = self.codec.decode(bytes)?;
        let mut root = decoded.root;
        let mut materials = MaterialSet::new();

        root.for_each_part_mut(&mut |part| {
            let handle = self.template.instantiate(request.color);
            materials.insert(part.key.clone(), handle.clone());
            part.material = Some(handle);
            part.cast_shadow = true;
            part.receive_shadow = true;
        });

        debug!(
            model = %request.id,
            parts = materials.len(),
            bytes = bytes.len(),
            "asset loaded"
        );

        let object = SceneObject {
            model_id: request.id.clone(),
            name: request.id.to_string(),
            position: request.placement.position,
            scale: request.placement.scale,
            visible: true,
            root,
        };
        Ok(LoadedAsset { object, materials })
    }
}

impl fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoader")
            .field("codec", &self.codec.name())
            .field("template", &self.template)
            .finish()
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::gltf()
    }
}
