use cgmath::SquareMatrix;
use flow_gltf::{
    Color, LoadOptions, load_model, load_model_from_slice, load_model_with,
    data_structures::material::MaterialMapKind,
    render::recorder::{DrawRecorder, MeshId},
};
use serde_json::json;

use crate::common::test_utils::{
    AssetBuilder, FLOAT, LINES, UNSIGNED_BYTE, base64_encode, init_logger, png_bytes, primitive,
    quad, scratch_dir, triangles,
};

mod common;

fn quad_asset() -> AssetBuilder {
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    let material = builder.material(json!({
        "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.5, 0.5, 1.0] }
    }));
    let mesh = builder.mesh(Some("quad"), vec![triangles(positions, Some(indices), Some(material))]);
    let node = builder.node(json!({ "mesh": mesh }));
    let scene = builder.scene(&[node]);
    builder.default_scene(scene);
    builder
}

#[test]
fn should_load_glb_quad_with_material() {
    init_logger();
    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&quad_asset().to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.meshes[0].vertex_count, 4);
    assert_eq!(model.meshes[0].triangle_count, 2);
    assert_eq!(model.meshes[0].indices, Some(vec![0, 1, 2, 0, 2, 3]));
    assert_eq!(model.material_count(), 2);
    assert_eq!(model.mesh_material, vec![1]);
    assert_eq!(
        model.materials[1][MaterialMapKind::Albedo].color,
        Color::new(255, 128, 128, 255)
    );
    assert_eq!(model.scene, Some(0));

    model
        .draw(&mut recorder, [0.0, 0.0, 0.0].into(), 1.0, Color::WHITE)
        .unwrap();
    assert_eq!(recorder.draws.len(), 1);
    assert_eq!(recorder.draws[0].transform, cgmath::Matrix4::identity());
    assert_eq!(recorder.draws[0].color, Color::new(255, 128, 128, 255));
}

#[test]
fn should_load_same_model_from_gltf_and_glb() {
    init_logger();
    let asset = quad_asset();
    let mut recorder = DrawRecorder::new();
    let from_glb = load_model_from_slice(&asset.to_glb(), &LoadOptions::default(), &mut recorder);
    let from_gltf = load_model_from_slice(&asset.to_gltf(), &LoadOptions::default(), &mut recorder);

    assert_eq!(from_glb.meshes, from_gltf.meshes);
    assert_eq!(from_glb.nodes, from_gltf.nodes);
    assert_eq!(from_glb.mesh_material, from_gltf.mesh_material);
}

#[test]
fn should_return_empty_model_for_missing_file() {
    init_logger();
    let mut recorder = DrawRecorder::new();
    let model = load_model("does/not/exist.glb", &mut recorder);

    assert_eq!(model.mesh_count(), 0);
    assert_eq!(model.material_count(), 1);
    assert_eq!(model.node_count(), 0);
    assert!(recorder.meshes.is_empty());
}

#[test]
fn should_return_empty_model_for_garbage() {
    init_logger();
    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(b"not a gltf file", &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 0);
    assert_eq!(model.material_count(), 1);
}

#[test]
fn should_leave_mesh_empty_for_u16_positions() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let positions = builder.u16_positions(&[[0, 0, 0], [1, 0, 0], [0, 1, 0]]);
    builder.mesh(None, vec![triangles(positions, None, None)]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.meshes[0].vertex_count, 0);
    assert!(model.meshes[0].positions.is_empty());
    assert_eq!(model.mesh_material, vec![0]);
}

#[test]
fn should_narrow_u32_indices() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, _) = quad(&mut builder);
    let indices = builder.u32_indices(&[0, 1, 2, 0, 2, 65539]);
    builder.mesh(None, vec![triangles(positions, Some(indices), None)]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.meshes[0].indices, Some(vec![0, 1, 2, 0, 2, 3]));
    assert_eq!(model.meshes[0].triangle_count, 2);
}

#[test]
fn should_draw_unindexed_for_u8_indices() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let positions = builder.positions(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    let indices = builder.u8_indices(&[0, 1, 2]);
    builder.mesh(None, vec![triangles(positions, Some(indices), None)]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.meshes[0].indices, None);
    assert_eq!(model.meshes[0].triangle_count, 1);
}

#[test]
fn should_count_triangles_of_unindexed_mesh() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let positions = builder.positions(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
    ]);
    builder.mesh(None, vec![triangles(positions, None, None)]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.meshes[0].vertex_count, 6);
    assert_eq!(model.meshes[0].triangle_count, 2);
    assert!(!recorder.meshes[0].indexed);
}

#[test]
fn should_skip_non_triangle_primitives() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    builder.mesh(
        Some("mixed"),
        vec![
            primitive(positions, Some(indices), None, LINES),
            triangles(positions, Some(indices), None),
        ],
    );
    let lines_only = builder.mesh(None, vec![primitive(positions, None, None, LINES)]);
    builder.node(json!({ "mesh": 0 }));
    builder.node(json!({ "mesh": lines_only }));

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.meshes[0].label, "mixed#1");
    assert_eq!(model.nodes[0].meshes, Some(0..1));
    assert_eq!(model.nodes[1].meshes, Some(1..1));
}

#[test]
fn should_keep_node_and_scene_structure() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    let mesh = builder.mesh(None, vec![triangles(positions, Some(indices), None)]);
    builder.node(json!({ "name": "root", "children": [1, 2], "translation": [1.0, 0.0, 0.0] }));
    builder.node(json!({ "mesh": mesh }));
    builder.node(json!({ "mesh": mesh, "scale": [2.0, 2.0, 2.0] }));
    builder.scene(&[0]);
    builder.scene(&[1]);
    builder.default_scene(1);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_gltf(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.node_count(), 3);
    assert_eq!(model.nodes[0].name.as_deref(), Some("root"));
    assert_eq!(model.nodes[0].children, vec![1, 2]);
    assert_eq!(model.nodes[0].meshes, None);
    assert!(!model.nodes[0].has_mesh());
    assert!(model.nodes[1].has_mesh());
    assert_eq!(model.nodes[0].matrix, cgmath::Matrix4::from_translation([1.0, 0.0, 0.0].into()));
    assert_eq!(model.nodes[2].matrix, cgmath::Matrix4::from_scale(2.0));
    assert_eq!(model.scene_count(), 2);
    assert_eq!(model.scenes[1].nodes, vec![1]);
    assert_eq!(model.active_scene(), Some(1));
}

#[test]
fn should_reject_cyclic_node_graph() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    let mesh = builder.mesh(None, vec![triangles(positions, Some(indices), None)]);
    builder.node(json!({ "children": [1] }));
    builder.node(json!({ "children": [0], "mesh": mesh }));
    builder.scene(&[0]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 0);
    assert_eq!(model.node_count(), 0);
    assert_eq!(model.material_count(), 1);
}

#[test]
fn should_generate_placeholder_only_on_request() {
    init_logger();
    let asset = AssetBuilder::new().to_gltf();
    let mut recorder = DrawRecorder::new();

    let model = load_model_from_slice(&asset, &LoadOptions::default(), &mut recorder);
    assert_eq!(model.mesh_count(), 0);
    assert!(recorder.meshes.is_empty());

    let options = LoadOptions {
        placeholder_mesh: true,
        ..Default::default()
    };
    let model = load_model_from_slice(&asset, &options, &mut recorder);
    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.meshes[0].vertex_count, 24);
    assert_eq!(model.meshes[0].triangle_count, 12);
    assert_eq!(model.mesh_material, vec![0]);
    assert_eq!(recorder.meshes.len(), 1);

    model
        .draw(&mut recorder, [0.0, 0.0, 0.0].into(), 1.0, Color::WHITE)
        .unwrap();
    assert_eq!(recorder.draws.len(), 1);
}

#[test]
fn should_create_embedded_textures() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    let albedo = builder.embedded_texture([255, 0, 0, 255], 2, 3);
    let normal = builder.uri_texture(&format!(
        "data:image/png;base64,{}",
        base64_encode(&png_bytes([128, 128, 255, 255], 1, 1))
    ));
    let material = builder.material(json!({
        "pbrMetallicRoughness": { "baseColorTexture": { "index": albedo } },
        "normalTexture": { "index": normal },
    }));
    builder.mesh(None, vec![triangles(positions, Some(indices), Some(material))]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(recorder.textures.len(), 2);
    let albedo = model.materials[1].texture(MaterialMapKind::Albedo).unwrap();
    assert_eq!((albedo.width, albedo.height), (2, 3));
    assert!(model.materials[1].texture(MaterialMapKind::Normal).is_some());
    assert!(model.materials[0].texture(MaterialMapKind::Albedo).is_none());
}

#[test]
fn should_resolve_external_files_next_to_asset() {
    init_logger();
    let dir = scratch_dir("external");
    std::fs::write(dir.join("albedo.png"), png_bytes([0, 255, 0, 255], 4, 4)).unwrap();

    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    let found = builder.uri_texture("albedo.png");
    let missing = builder.uri_texture("missing.png");
    let material = builder.material(json!({
        "pbrMetallicRoughness": { "baseColorTexture": { "index": found } },
        "emissiveTexture": { "index": missing },
    }));
    builder.mesh(None, vec![triangles(positions, Some(indices), Some(material))]);
    let (gltf, bin) = builder.to_gltf_external("quad.bin");
    std::fs::write(dir.join("quad.gltf"), gltf).unwrap();
    std::fs::write(dir.join("quad.bin"), bin).unwrap();

    let mut recorder = DrawRecorder::new();
    let model = load_model(dir.join("quad.gltf"), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.meshes[0].triangle_count, 2);
    let albedo = model.materials[1].texture(MaterialMapKind::Albedo).unwrap();
    assert_eq!((albedo.width, albedo.height), (4, 4));
    assert!(model.materials[1].texture(MaterialMapKind::Emission).is_none());

    model
        .draw(&mut recorder, [0.0, 0.0, 0.0].into(), 1.0, Color::WHITE)
        .unwrap();
    assert_eq!(recorder.draws[0].albedo.as_ref(), Some(albedo));
}

#[test]
fn should_resolve_in_memory_assets_against_base_dir() {
    init_logger();
    let dir = scratch_dir("base-dir");
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    builder.mesh(None, vec![triangles(positions, Some(indices), None)]);
    let (gltf, bin) = builder.to_gltf_external("buffers/quad.bin");
    std::fs::create_dir_all(dir.join("buffers")).unwrap();
    std::fs::write(dir.join("buffers/quad.bin"), bin).unwrap();

    let mut recorder = DrawRecorder::new();
    let without = load_model_from_slice(&gltf, &LoadOptions::default(), &mut recorder);
    assert_eq!(without.mesh_count(), 0);

    let options = LoadOptions {
        base_dir: Some(dir.clone()),
        ..Default::default()
    };
    let with = load_model_from_slice(&gltf, &options, &mut recorder);
    assert_eq!(with.mesh_count(), 1);

    std::fs::write(dir.join("elsewhere.gltf"), &gltf).unwrap();
    let from_path = load_model_with(dir.join("elsewhere.gltf"), &options, &mut recorder);
    assert_eq!(from_path.mesh_count(), 1);
}

#[test]
fn should_release_meshes_on_unload() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    builder.mesh(
        None,
        vec![
            triangles(positions, Some(indices), None),
            triangles(positions, None, None),
        ],
    );

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);
    assert_eq!(model.mesh_count(), 2);

    model.unload(&mut recorder);
    assert_eq!(recorder.released, vec![MeshId(0), MeshId(1)]);
}

#[test]
fn should_load_interleaved_vertex_attributes() {
    init_logger();
    let mut builder = AssetBuilder::new();
    // position.xyz, normal.xyz, uv.xy
    let vertices: [[f32; 8]; 4] = [
        [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0],
        [1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0],
    ];
    let bytes: Vec<u8> = vertices.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
    let view = builder.strided_view(&bytes, 32);
    let positions = builder.accessor_in_view(view, 0, FLOAT, 4, "VEC3");
    builder.with_bounds(positions, [0.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    let normals = builder.accessor_in_view(view, 12, FLOAT, 4, "VEC3");
    let uvs = builder.accessor_in_view(view, 24, FLOAT, 4, "VEC2");
    let tangent_bytes: Vec<u8> = [1.0f32, 0.0, 0.0, 1.0]
        .repeat(4)
        .into_iter()
        .flat_map(f32::to_le_bytes)
        .collect();
    let tangents = builder.accessor(&tangent_bytes, FLOAT, 4, "VEC4");
    let colors = builder.accessor(&[255u8, 0, 0, 255].repeat(4), UNSIGNED_BYTE, 4, "VEC4");
    builder.accessors_mut()[colors]["normalized"] = json!(true);
    let indices = builder.u16_indices(&[0, 1, 2, 0, 2, 3]);
    let albedo = builder.embedded_texture([255, 255, 255, 255], 2, 2);
    let material = builder.material(json!({
        "pbrMetallicRoughness": {
            "baseColorFactor": [1.0, 0.5, 0.5, 1.0],
            "baseColorTexture": { "index": albedo },
        }
    }));
    let mut primitive = triangles(positions, Some(indices), Some(material));
    primitive["attributes"]["NORMAL"] = json!(normals);
    primitive["attributes"]["TEXCOORD_0"] = json!(uvs);
    primitive["attributes"]["TANGENT"] = json!(tangents);
    primitive["attributes"]["COLOR_0"] = json!(colors);
    let mesh = builder.mesh(Some("interleaved"), vec![primitive]);
    let node = builder.node(json!({ "mesh": mesh }));
    let scene = builder.scene(&[node]);
    builder.default_scene(scene);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    let mesh = &model.meshes[0];
    assert_eq!(mesh.label, "interleaved#0");
    assert_eq!(mesh.vertex_count, 4);
    assert_eq!(mesh.triangle_count, 2);
    assert_eq!(
        mesh.positions,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
    );
    assert_eq!(mesh.normals, Some([0.0f32, 0.0, 1.0].repeat(4)));
    assert_eq!(mesh.tex_coords, Some(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]));
    assert_eq!(mesh.tangents, Some([1.0f32, 0.0, 0.0, 1.0].repeat(4)));
    assert_eq!(mesh.colors, Some([255u8, 0, 0, 255].repeat(4)));

    assert_eq!(model.material_count(), 2);
    assert_eq!(
        model.materials[1][MaterialMapKind::Albedo].color,
        Color::new(255, 128, 128, 255)
    );
    let texture = model.materials[1].texture(MaterialMapKind::Albedo).unwrap();
    assert_eq!((texture.width, texture.height), (2, 2));

    model
        .draw(&mut recorder, [0.0, 0.0, 0.0].into(), 1.0, Color::WHITE)
        .unwrap();
    assert_eq!(recorder.draws.len(), 1);
    assert_eq!(recorder.draws[0].transform, cgmath::Matrix4::identity());
    assert_eq!(recorder.draws[0].albedo.as_ref(), Some(texture));
}

#[test]
fn should_skip_accessor_with_unaddressable_count() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let positions = builder.accessor(&[0u8; 48], FLOAT, 1 << 62, "VEC3");
    builder.with_bounds(positions, [0.0; 3], [1.0; 3]);
    builder.mesh(None, vec![triangles(positions, None, None)]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.meshes[0].vertex_count, 0);
    assert!(model.meshes[0].positions.is_empty());
}

#[test]
fn should_leave_slot_empty_for_image_view_past_buffer() {
    init_logger();
    let mut builder = AssetBuilder::new();
    let (positions, indices) = quad(&mut builder);
    let albedo = builder.embedded_texture([255, 0, 0, 255], 1, 1);
    let image_view = builder.views_mut().len() - 1;
    builder.views_mut()[image_view]["byteOffset"] = json!(u64::MAX - 3);
    builder.views_mut()[image_view]["byteLength"] = json!(8);
    let material = builder.material(json!({
        "pbrMetallicRoughness": { "baseColorTexture": { "index": albedo } }
    }));
    builder.mesh(None, vec![triangles(positions, Some(indices), Some(material))]);

    let mut recorder = DrawRecorder::new();
    let model = load_model_from_slice(&builder.to_glb(), &LoadOptions::default(), &mut recorder);

    assert_eq!(model.mesh_count(), 1);
    assert_eq!(model.material_count(), 2);
    assert!(model.materials[1].texture(MaterialMapKind::Albedo).is_none());
    assert!(recorder.textures.is_empty());
}
