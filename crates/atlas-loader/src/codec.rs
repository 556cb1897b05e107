//! Decoding a raw asset buffer into a [`SceneNode`] hierarchy.

use std::collections::HashSet;

use gltf::mesh::Semantic;
use tracing::debug;

use atlas_types::Vec3;

use crate::error::{LoaderError, LoaderResult};
use crate::scene::{MeshPart, SceneNode};

/// Deepest node hierarchy a codec will follow.
pub const MAX_DEPTH: usize = 64;

/// Output of a codec, before materials and placement are applied.
#[derive(Clone, Debug)]
pub struct DecodedScene {
    pub root: SceneNode,
}

/// Turns bytes into a scene graph.
///
/// Implementations must be pure: no I/O, no global state. The pipeline runs
/// them on a blocking worker.
pub trait SceneCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> LoaderResult<DecodedScene>;
}

/// Binary (`.glb`) and JSON glTF 2.0.
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfCodec;

impl SceneCodec for GltfCodec {
    fn name(&self) -> &'static str {
        "gltf"
    }

    fn decode(&self, bytes: &[u8]) -> LoaderResult<DecodedScene> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| LoaderError::Decode(e.to_string()))?;

        let (label, roots): (String, Vec<gltf::Node<'_>>) =
            match gltf.default_scene().or_else(|| gltf.scenes().next()) {
                Some(scene) => (
                    scene.name().unwrap_or("scene").to_string(),
                    scene.nodes().collect(),
                ),
                None => ("scene".to_string(), parentless(&gltf)),
            };

        let mut root = SceneNode::group(label);
        for node in roots {
            root.children.push(convert(&node, 1)?);
        }
        debug!(
            nodes = root.node_count(),
            codec = self.name(),
            "decoded scene"
        );
        Ok(DecodedScene { root })
    }
}

/// Nodes no other node lists as a child, for documents without scenes.
fn parentless<'a>(doc: &'a gltf::Document) -> Vec<gltf::Node<'a>> {
    let children: HashSet<usize> = doc
        .nodes()
        .flat_map(|n| n.children().map(|c| c.index()))
        .collect();
    doc.nodes()
        .filter(|n| !children.contains(&n.index()))
        .collect()
}

fn convert(node: &gltf::Node<'_>, depth: usize) -> LoaderResult<SceneNode> {
    if depth > MAX_DEPTH {
        return Err(LoaderError::TooDeep { max: MAX_DEPTH });
    }
    let (translation, _rotation, scale) = node.transform().decomposed();
    let mut out = SceneNode {
        name: node.name().map(str::to_string),
        translation: Vec3::from(translation),
        scale: Vec3::from(scale),
        parts: Vec::new(),
        children: Vec::new(),
    };

    if let Some(mesh) = node.mesh() {
        for (j, primitive) in mesh.primitives().enumerate() {
            let vertex_count = primitive
                .get(&Semantic::Positions)
                .map(|a| a.count())
                .unwrap_or(0);
            let mut part = MeshPart::new(format!("node{}/prim{}", node.index(), j), vertex_count);
            part.name = mesh.name().map(str::to_string);
            out.parts.push(part);
        }
    }

    for child in node.children() {
        out.children.push(convert(&child, depth + 1)?);
    }
    Ok(out)
}
