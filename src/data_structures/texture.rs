//! GPU textures for the wgpu backend.
//!
//! [`Texture`] bundles a wgpu texture with its view and an optional sampler.
//! Material textures come from decoded [`RgbaImage`]s; the material slot they
//! fill decides whether the texels are stored as sRGB or linear data.

use image::RgbaImage;

use crate::data_structures::material::MaterialMapKind;

/// How texel values are interpreted by the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Colours authored for display, decoded to linear when sampled.
    Srgb,
    /// Raw data such as normals, roughness or occlusion.
    Linear,
}

impl ColorSpace {
    pub fn for_slot(kind: MaterialMapKind) -> Self {
        match kind {
            MaterialMapKind::Albedo | MaterialMapKind::Emission => ColorSpace::Srgb,
            MaterialMapKind::Metalness
            | MaterialMapKind::Normal
            | MaterialMapKind::Roughness
            | MaterialMapKind::Occlusion => ColorSpace::Linear,
        }
    }

    fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A GPU texture with a view and optional sampler.
///
/// Cloning is cheap and shares the GPU resource, which is what allows several
/// materials (and several models) to reference one texture.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment of `size` pixels, clamped to at least 1x1.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(size[0].max(1), size[1].max(1)),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            sampler: None,
        }
    }

    /// A 1x1 texture of a single colour.
    ///
    /// Bound in place of material slots without a texture, so the shader
    /// never has to branch on texture presence.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
        space: ColorSpace,
    ) -> Self {
        let pixel = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_image(device, queue, &pixel, Some(label), space)
    }

    /// Upload a decoded image with a repeating linear sampler.
    ///
    /// The caller checks the dimensions against the device limits.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: Option<&str>,
        space: ColorSpace,
    ) -> Self {
        let (width, height) = image.dimensions();
        let size = extent(width, height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: space.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: Some(create_default_sampler(device)),
            texture,
        }
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
