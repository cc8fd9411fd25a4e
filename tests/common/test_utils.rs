#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;

use serde_json::{Value, json};

pub const FLOAT: u32 = 5126;
pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_INT: u32 = 5125;

pub const LINES: u32 = 1;
pub const TRIANGLES: u32 = 4;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assembles small glTF documents with a single binary buffer.
#[derive(Default)]
pub struct AssetBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    materials: Vec<Value>,
    images: Vec<Value>,
    textures: Vec<Value>,
    nodes: Vec<Value>,
    scenes: Vec<Value>,
    scene: Option<usize>,
}

impl AssetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        }));
        self.bin.extend_from_slice(bytes);
        self.views.len() - 1
    }

    /// A view of elements `stride` bytes apart, for interleaved attributes.
    pub fn strided_view(&mut self, bytes: &[u8], stride: usize) -> usize {
        let view = self.view(bytes);
        self.views[view]["byteStride"] = json!(stride);
        view
    }

    pub fn accessor(&mut self, bytes: &[u8], component_type: u32, count: usize, kind: &str) -> usize {
        let view = self.view(bytes);
        self.accessor_in_view(view, 0, component_type, count, kind)
    }

    pub fn accessor_in_view(
        &mut self,
        view: usize,
        byte_offset: usize,
        component_type: u32,
        count: usize,
        kind: &str,
    ) -> usize {
        self.accessors.push(json!({
            "bufferView": view,
            "byteOffset": byte_offset,
            "componentType": component_type,
            "count": count,
            "type": kind,
        }));
        self.accessors.len() - 1
    }

    /// Raw JSON of the views, for assets no well-behaved exporter writes.
    pub fn views_mut(&mut self) -> &mut Vec<Value> {
        &mut self.views
    }

    pub fn accessors_mut(&mut self) -> &mut Vec<Value> {
        &mut self.accessors
    }

    /// POSITION accessors must declare their bounds.
    pub fn with_bounds(&mut self, accessor: usize, min: [f32; 3], max: [f32; 3]) -> usize {
        self.accessors[accessor]["min"] = json!(min);
        self.accessors[accessor]["max"] = json!(max);
        accessor
    }

    pub fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        let bytes: Vec<u8> = positions.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        let accessor = self.accessor(&bytes, FLOAT, positions.len(), "VEC3");
        self.with_bounds(accessor, min, max)
    }

    pub fn u16_positions(&mut self, positions: &[[u16; 3]]) -> usize {
        let bytes: Vec<u8> = positions.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        let accessor = self.accessor(&bytes, UNSIGNED_SHORT, positions.len(), "VEC3");
        self.with_bounds(accessor, [0.0; 3], [u16::MAX as f32; 3])
    }

    pub fn u16_indices(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.accessor(&bytes, UNSIGNED_SHORT, indices.len(), "SCALAR")
    }

    pub fn u32_indices(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.accessor(&bytes, UNSIGNED_INT, indices.len(), "SCALAR")
    }

    pub fn u8_indices(&mut self, indices: &[u8]) -> usize {
        self.accessor(indices, UNSIGNED_BYTE, indices.len(), "SCALAR")
    }

    pub fn tex_coords(&mut self, uvs: &[[f32; 2]]) -> usize {
        let bytes: Vec<u8> = uvs.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        self.accessor(&bytes, FLOAT, uvs.len(), "VEC2")
    }

    pub fn mesh(&mut self, name: Option<&str>, primitives: Vec<Value>) -> usize {
        let mut mesh = json!({ "primitives": primitives });
        if let Some(name) = name {
            mesh["name"] = json!(name);
        }
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn material(&mut self, material: Value) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// A `w`x`h` PNG of one colour, stored in a buffer view.
    pub fn embedded_texture(&mut self, rgba: [u8; 4], w: u32, h: u32) -> usize {
        let view = self.view(&png_bytes(rgba, w, h));
        self.images.push(json!({ "bufferView": view, "mimeType": "image/png" }));
        self.texture(self.images.len() - 1)
    }

    /// A texture whose image lives at `uri`, relative or `data:`.
    pub fn uri_texture(&mut self, uri: &str) -> usize {
        self.images.push(json!({ "uri": uri }));
        self.texture(self.images.len() - 1)
    }

    fn texture(&mut self, image: usize) -> usize {
        self.textures.push(json!({ "source": image }));
        self.textures.len() - 1
    }

    pub fn node(&mut self, node: Value) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn scene(&mut self, roots: &[usize]) -> usize {
        self.scenes.push(json!({ "nodes": roots }));
        self.scenes.len() - 1
    }

    pub fn default_scene(&mut self, scene: usize) {
        self.scene = Some(scene);
    }

    fn document(&self, buffer: Option<Value>) -> Value {
        let mut root = json!({ "asset": { "version": "2.0" } });
        if let Some(buffer) = buffer {
            root["buffers"] = json!([buffer]);
        }
        for (key, values) in [
            ("bufferViews", &self.views),
            ("accessors", &self.accessors),
            ("meshes", &self.meshes),
            ("materials", &self.materials),
            ("images", &self.images),
            ("textures", &self.textures),
            ("nodes", &self.nodes),
            ("scenes", &self.scenes),
        ] {
            if !values.is_empty() {
                root[key] = json!(values);
            }
        }
        if let Some(scene) = self.scene {
            root["scene"] = json!(scene);
        }
        root
    }

    fn padded_bin(&self) -> Vec<u8> {
        let mut bin = self.bin.clone();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        bin
    }

    /// `.gltf` with the buffer embedded as a base64 data URI.
    pub fn to_gltf(&self) -> Vec<u8> {
        let buffer = (!self.bin.is_empty()).then(|| {
            let bin = self.padded_bin();
            json!({
                "byteLength": bin.len(),
                "uri": format!("data:application/octet-stream;base64,{}", base64_encode(&bin)),
            })
        });
        serde_json::to_vec(&self.document(buffer)).unwrap()
    }

    /// `.gltf` referencing its buffer as the external file `bin_uri`.
    /// Returns the JSON and the buffer contents.
    pub fn to_gltf_external(&self, bin_uri: &str) -> (Vec<u8>, Vec<u8>) {
        let bin = self.padded_bin();
        let buffer = json!({ "byteLength": bin.len(), "uri": bin_uri });
        (serde_json::to_vec(&self.document(Some(buffer))).unwrap(), bin)
    }

    pub fn to_glb(&self) -> Vec<u8> {
        let bin = self.padded_bin();
        let buffer = (!bin.is_empty()).then(|| json!({ "byteLength": bin.len() }));
        let mut json = serde_json::to_vec(&self.document(buffer)).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let mut length = 12 + 8 + json.len();
        if !bin.is_empty() {
            length += 8 + bin.len();
        }
        let mut glb = Vec::with_capacity(length);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(length as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        if !bin.is_empty() {
            glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            glb.extend_from_slice(b"BIN\0");
            glb.extend_from_slice(&bin);
        }
        glb
    }
}

/// Indexed unit quad in the XY plane, two triangles.
pub fn quad(builder: &mut AssetBuilder) -> (usize, usize) {
    let positions = builder.positions(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    let indices = builder.u16_indices(&[0, 1, 2, 0, 2, 3]);
    (positions, indices)
}

pub fn triangles(positions: usize, indices: Option<usize>, material: Option<usize>) -> Value {
    primitive(positions, indices, material, TRIANGLES)
}

pub fn primitive(positions: usize, indices: Option<usize>, material: Option<usize>, mode: u32) -> Value {
    let mut primitive = json!({ "attributes": { "POSITION": positions }, "mode": mode });
    if let Some(indices) = indices {
        primitive["indices"] = json!(indices);
    }
    if let Some(material) = material {
        primitive["material"] = json!(material);
    }
    primitive
}

pub fn png_bytes(rgba: [u8; 4], w: u32, h: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b = [chunk[0], *chunk.get(1).unwrap_or(&0), *chunk.get(2).unwrap_or(&0)];
        let n = (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32;
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(ALPHABET[(n >> (18 - 6 * i) & 63) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

/// Fresh per-test directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flow-gltf-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
