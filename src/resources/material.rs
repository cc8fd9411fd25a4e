use std::path::Path;

use image::RgbaImage;

use crate::{
    data_structures::{
        color::{Color, factor_to_u8},
        material::{MaterialMapKind, RenderMaterial},
    },
    resources::image::resolve_image,
};

/// Build the CPU side of one glTF material from its metallic-roughness core.
///
/// Extension models (clearcoat, transmission, sheen, ...) are ignored. Images
/// that fail to resolve leave their slot untextured.
pub fn build_material(
    material: &gltf::Material,
    buffers: &[gltf::buffer::Data],
    base_dir: &Path,
) -> RenderMaterial<RgbaImage> {
    let load = |texture: gltf::Texture| resolve_image(&texture.source(), buffers, base_dir);

    let mut out = RenderMaterial::new_default();
    out.name = material.name().map(str::to_string);

    let pbr = material.pbr_metallic_roughness();
    if let Some(info) = pbr.base_color_texture() {
        out[MaterialMapKind::Albedo].texture = load(info.texture());
    }
    out[MaterialMapKind::Albedo].color = Color::from_factors(pbr.base_color_factor());

    // Factors only travel with a metallic-roughness texture.
    if let Some(info) = pbr.metallic_roughness_texture() {
        out[MaterialMapKind::Roughness].texture = load(info.texture());
        out[MaterialMapKind::Roughness].value = pbr.roughness_factor();
        out[MaterialMapKind::Metalness].value = pbr.metallic_factor();
    }

    if let Some(normal) = material.normal_texture() {
        out[MaterialMapKind::Normal].texture = load(normal.texture());
    }
    if let Some(occlusion) = material.occlusion_texture() {
        out[MaterialMapKind::Occlusion].texture = load(occlusion.texture());
    }
    if let Some(info) = material.emissive_texture() {
        let emission = &mut out[MaterialMapKind::Emission];
        emission.texture = load(info.texture());
        let [r, g, b] = material.emissive_factor();
        emission.color = Color::new(factor_to_u8(r), factor_to_u8(g), factor_to_u8(b), 255);
    }

    out
}
