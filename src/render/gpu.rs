//! wgpu implementation of [`RenderBackend`].
//!
//! Draw calls are not encoded immediately. [`WgpuBackend::draw_mesh`] prepares
//! the per-draw uniform and material bind groups and queues the draw;
//! [`WgpuBackend::submit`] replays the queue into a single render pass on the
//! caller's target.

use anyhow::ensure;
use cgmath::SquareMatrix;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        material::{MaterialMapKind, RenderMaterial},
        mesh::RenderMesh,
        texture::{ColorSpace, Texture, create_default_sampler},
        vertex::interleave,
    },
    pipelines::basic::{DrawUniform, draw_uniform_layout, material_layout, mk_model_pipeline},
    render::RenderBackend,
};

/// Vertex and index buffers of one uploaded mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    pub num_elements: u32,
}

struct PendingDraw {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    num_elements: u32,
    uniform: wgpu::BindGroup,
    material: wgpu::BindGroup,
    wireframe: bool,
}

pub struct WgpuBackend {
    pub ctx: Context,
    /// Camera matrix applied after each draw's world matrix.
    pub view_proj: cgmath::Matrix4<f32>,
    pub clear_colour: wgpu::Color,
    fill_pipeline: wgpu::RenderPipeline,
    wire_pipeline: Option<wgpu::RenderPipeline>,
    uniform_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    white: Texture,
    flat_normal: Texture,
    sampler: wgpu::Sampler,
    wireframe: bool,
    pending: Vec<PendingDraw>,
}

impl WgpuBackend {
    pub fn new(ctx: Context) -> Self {
        let uniform_layout = draw_uniform_layout(&ctx.device);
        let material_layout = material_layout(&ctx.device);
        let fill_pipeline = mk_model_pipeline(
            &ctx.device,
            ctx.format,
            &uniform_layout,
            &material_layout,
            wgpu::PolygonMode::Fill,
        );
        let wire_pipeline = ctx.supports_wireframe().then(|| {
            mk_model_pipeline(
                &ctx.device,
                ctx.format,
                &uniform_layout,
                &material_layout,
                wgpu::PolygonMode::Line,
            )
        });
        let white = Texture::solid(&ctx.device, &ctx.queue, [255; 4], "white", ColorSpace::Srgb);
        // The blue/purple-ish colour that represents the default for normal maps
        let flat_normal = Texture::solid(
            &ctx.device,
            &ctx.queue,
            [127, 127, 255, 255],
            "flat normal",
            ColorSpace::Linear,
        );
        let sampler = create_default_sampler(&ctx.device);

        Self {
            ctx,
            view_proj: cgmath::Matrix4::identity(),
            clear_colour: wgpu::Color::BLACK,
            fill_pipeline,
            wire_pipeline,
            uniform_layout,
            material_layout,
            sampler,
            white,
            flat_normal,
            wireframe: false,
            pending: Vec::new(),
        }
    }

    pub fn pending_draws(&self) -> usize {
        self.pending.len()
    }

    /// Encode every queued draw into one render pass and submit it.
    ///
    /// Both attachments are cleared first. `depth` must use
    /// [`Texture::DEPTH_FORMAT`] and match the size of `view`.
    pub fn submit(&mut self, view: &wgpu::TextureView, depth: &wgpu::TextureView) -> wgpu::SubmissionIndex {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Model Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Model Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            for draw in self.pending.drain(..) {
                let pipeline = match (&self.wire_pipeline, draw.wireframe) {
                    (Some(wire), true) => wire,
                    _ => &self.fill_pipeline,
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &draw.uniform, &[]);
                render_pass.set_bind_group(1, &draw.material, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                match &draw.index_buffer {
                    Some(indices) => {
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                        render_pass.draw_indexed(0..draw.num_elements, 0, 0..1);
                    }
                    None => render_pass.draw(0..draw.num_elements, 0..1),
                }
            }
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()))
    }

    fn material_bind_group(&self, material: &RenderMaterial<Texture>) -> wgpu::BindGroup {
        let albedo = material.texture(MaterialMapKind::Albedo).unwrap_or(&self.white);
        let normal = material
            .texture(MaterialMapKind::Normal)
            .unwrap_or(&self.flat_normal);
        let albedo_sampler = albedo.sampler.as_ref().unwrap_or(&self.sampler);
        let normal_sampler = normal.sampler.as_ref().unwrap_or(&self.sampler);
        self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&albedo.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(albedo_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(normal_sampler),
                },
            ],
            label: material.name.as_deref(),
        })
    }
}

impl RenderBackend for WgpuBackend {
    type Mesh = GpuMesh;
    type Texture = Texture;

    fn upload_mesh(&mut self, mesh: &RenderMesh) -> anyhow::Result<GpuMesh> {
        ensure!(!mesh.is_empty(), "mesh {} has no vertices", mesh.label);
        let vertices = interleave(mesh);
        let vertex_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", mesh.label)),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = mesh.indices.as_ref().map(|indices| {
            self.ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", mesh.label)),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        Ok(GpuMesh {
            name: mesh.label.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.element_count() as u32,
        })
    }

    /// Destroys the buffers right away, so queued draws of the mesh must be
    /// submitted first.
    fn release_mesh(&mut self, mesh: GpuMesh) {
        mesh.vertex_buffer.destroy();
        if let Some(indices) = mesh.index_buffer {
            indices.destroy();
        }
    }

    fn create_texture(
        &mut self,
        image: &RgbaImage,
        kind: MaterialMapKind,
        label: &str,
    ) -> anyhow::Result<Texture> {
        let max = self.ctx.device.limits().max_texture_dimension_2d;
        ensure!(
            image.width() > 0 && image.height() > 0,
            "texture {} is empty",
            label
        );
        ensure!(
            image.width() <= max && image.height() <= max,
            "texture {} is {}x{}, device limit is {}",
            label,
            image.width(),
            image.height(),
            max
        );
        Ok(Texture::from_image(
            &self.ctx.device,
            &self.ctx.queue,
            image,
            Some(label),
            ColorSpace::for_slot(kind),
        ))
    }

    fn draw_mesh(
        &mut self,
        mesh: &GpuMesh,
        material: &RenderMaterial<Texture>,
        transform: cgmath::Matrix4<f32>,
    ) -> anyhow::Result<()> {
        let uniform = DrawUniform {
            model: transform.into(),
            view_proj: self.view_proj.into(),
            albedo: material[MaterialMapKind::Albedo].color.to_f32(),
        };
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Draw Uniform", mesh.name)),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let uniform = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("draw_uniform_bind_group"),
        });

        self.pending.push(PendingDraw {
            vertex_buffer: mesh.vertex_buffer.clone(),
            index_buffer: mesh.index_buffer.clone(),
            num_elements: mesh.num_elements,
            uniform,
            material: self.material_bind_group(material),
            wireframe: self.wireframe,
        });
        Ok(())
    }

    fn set_wireframe(&mut self, enabled: bool) {
        if enabled && self.wire_pipeline.is_none() {
            log::warn!("GPU: Device lacks line polygon mode, drawing wireframes filled");
        }
        self.wireframe = enabled;
    }
}
