//! In-memory glTF fixtures for tests.

use serde_json::{json, Value};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Three `VEC3` float positions: one triangle.
pub fn triangle_positions() -> Vec<u8> {
    let verts: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    verts.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn triangle_document(buffer: Value) -> Value {
    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "triangle", "nodes": [0] }],
        "nodes": [{ "name": "tri", "mesh": 0 }],
        "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "buffers": [buffer]
    })
}

/// JSON glTF referencing an external buffer the codec never fetches.
pub fn triangle_gltf_json() -> String {
    triangle_document(json!({ "byteLength": 36, "uri": "triangle.bin" })).to_string()
}

/// Single-triangle binary glTF.
pub fn triangle_glb() -> Vec<u8> {
    glb(&triangle_document(json!({ "byteLength": 36 })), &triangle_positions())
}

/// Two nested nodes; the child carries a two-primitive mesh.
pub fn assembly_glb() -> Vec<u8> {
    let doc = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "body", "mesh": 0, "children": [1] },
            { "name": "lobe", "mesh": 1, "translation": [1.0, 0.0, 0.0] }
        ],
        "meshes": [
            { "primitives": [{ "attributes": { "POSITION": 0 } }] },
            { "primitives": [
                { "attributes": { "POSITION": 0 } },
                { "attributes": { "POSITION": 0 } }
            ] }
        ],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36 }]
    });
    glb(&doc, &triangle_positions())
}

/// Assemble a GLB container from a JSON document and a binary chunk.
pub fn glb(doc: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json = doc.to_string().into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin);
    out
}
