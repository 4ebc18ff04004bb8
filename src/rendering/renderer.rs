use std::sync::Arc;

use anyhow::Context;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    config::RenderingConfig,
    demo::DemoState,
    rendering::{
        global_uniform::GlobalUniformState,
        imgui_renderer::ImguiRendererState,
        instance::{gather_instances, InstanceBuffer},
        mesh_buffers::MeshBuffers,
        passes::cube_cloud_pass::{CubeCloudDraw, CubeCloudPass, CubeCloudTextureViews},
        render_common::RenderCommon,
        shader_loader::{PipelineCacheBuilder, ShaderLoader, SHADER_FOLDER},
        texture::DepthTexture,
    },
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    mesh_buffers: MeshBuffers,
    instance_buffer: InstanceBuffer,
    clear_color: wgpu::Color,

    shader_loader: ShaderLoader,
    cube_cloud_pass: CubeCloudPass,
    imgui_renderer: ImguiRendererState,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        config: &RenderingConfig,
        demo_state: &DemoState,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let common = Arc::new(RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            config.vsync,
        )?);

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let mut cache_builder = PipelineCacheBuilder::new();
        let cube_cloud_pass = CubeCloudPass::create(&device, common.clone(), &mut cache_builder)?;
        let shader_loader = ShaderLoader::new(
            device.clone(),
            cache_builder,
            SHADER_FOLDER,
            config.shader_hot_reload,
        )?;

        let scene = &demo_state.scene;
        let mesh_buffers = MeshBuffers::new(&device, scene.geometry(), scene.generation());
        let instance_buffer = InstanceBuffer::new(&device);

        let imgui_renderer =
            ImguiRendererState::new(&device, &queue, common.surface_format(), imgui_context);

        let [r, g, b, a] = config.clear_color;

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            mesh_buffers,
            instance_buffer,
            clear_color: wgpu::Color { r, g, b, a },
            shader_loader,
            cube_cloud_pass,
            imgui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let mut config = match self.common.output_surface_config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
        self.depth_texture.resize(&self.device, new_size);
    }

    pub fn render(
        &mut self,
        demo_state: &DemoState,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        let scene = &demo_state.scene;
        self.mesh_buffers
            .sync(&self.device, scene.geometry(), scene.generation());

        self.common.camera.update(&self.queue, &demo_state.camera);
        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(self.size, demo_state.time(), demo_state.vertex_colors),
        );

        let instances = gather_instances(scene, &demo_state.camera);
        let instance_count = self.instance_buffer.write(&self.queue, &instances);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.cube_cloud_pass.render(
            &CubeCloudTextureViews {
                color: &view,
                depth: self.depth_texture.view(),
            },
            &mut encoder,
            &self.shader_loader.cache,
            &CubeCloudDraw {
                clear_color: self.clear_color,
                mesh_buffers: &self.mesh_buffers,
                instance_buffer: &self.instance_buffer,
                instance_count,
            },
        );

        if let Err(e) = self.imgui_renderer.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        ) {
            log::error!("{:?}", e);
        }

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
