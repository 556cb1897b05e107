//! Scene-attachable object graph produced by the loader.

use atlas_types::{ModelId, ModelSummary, Vec3};

use crate::material::MaterialHandle;

/// One renderable primitive.
#[derive(Clone, Debug)]
pub struct MeshPart {
    /// Stable key within the asset, `node{n}/prim{p}`.
    pub key: String,
    pub name: Option<String>,
    pub vertex_count: usize,
    pub material: Option<MaterialHandle>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshPart {
    pub fn new(key: impl Into<String>, vertex_count: usize) -> Self {
        Self {
            key: key.into(),
            name: None,
            vertex_count,
            material: None,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// A node in the decoded hierarchy.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub translation: Vec3,
    pub scale: Vec3,
    pub parts: Vec<MeshPart>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            ..Self::default()
        }
    }

    /// Depth-first visit of every part under this node.
    pub fn for_each_part(&self, f: &mut impl FnMut(&MeshPart)) {
        for part in &self.parts {
            f(part);
        }
        for child in &self.children {
            child.for_each_part(f);
        }
    }

    pub fn for_each_part_mut(&mut self, f: &mut impl FnMut(&mut MeshPart)) {
        for part in &mut self.parts {
            f(part);
        }
        for child in &mut self.children {
            child.for_each_part_mut(f);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

/// A loaded asset ready to be attached to the scene.
///
/// The root is tagged with the model id, the requested placement, and a
/// visibility flag the registry toggles.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub model_id: ModelId,
    pub name: String,
    pub position: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    pub root: SceneNode,
}

impl SceneObject {
    /// All parts in depth-first order.
    pub fn parts(&self) -> Vec<&MeshPart> {
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    pub fn part_count(&self) -> usize {
        let mut n = 0;
        self.root.for_each_part(&mut |_| n += 1);
        n
    }

    /// Every material handle attached to a part.
    pub fn materials(&self) -> Vec<MaterialHandle> {
        let mut out = Vec::new();
        self.root.for_each_part(&mut |part| {
            if let Some(m) = &part.material {
                out.push(m.clone());
            }
        });
        out
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.model_id.clone(),
            name: self.name.clone(),
            visible: self.visible,
            position: self.position,
        }
    }
}

fn collect<'a>(node: &'a SceneNode, out: &mut Vec<&'a MeshPart>) {
    out.extend(node.parts.iter());
    for child in &node.children {
        collect(child, out);
    }
}
