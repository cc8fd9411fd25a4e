//! Headless GPU context: instance, adapter, device and queue.

use crate::data_structures::texture;

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Colour format render targets are expected in.
    pub format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

impl Context {
    /// Request a device without a surface.
    ///
    /// Line polygon mode is requested whenever the adapter offers it, so
    /// wireframe draws work where the hardware allows.
    pub async fn new_headless(format: wgpu::TextureFormat) -> anyhow::Result<Self> {
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        let mut descriptor = wgpu::InstanceDescriptor::new_without_display_handle();
        descriptor.backends = wgpu::Backends::PRIMARY;
        let instance = wgpu::Instance::new(descriptor);

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("GPU: Using adapter {:?}", adapter.get_info().name);

        let required_features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-gltf device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device,
            queue,
            format,
            depth_format: texture::Texture::DEPTH_FORMAT,
        })
    }

    pub fn new_headless_blocking(format: wgpu::TextureFormat) -> anyhow::Result<Self> {
        futures::executor::block_on(Self::new_headless(format))
    }

    pub fn supports_wireframe(&self) -> bool {
        self.device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
    }
}
