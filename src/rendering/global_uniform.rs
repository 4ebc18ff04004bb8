use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

/// This should match `GlobalUniform` in `cube_cloud.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GlobalUniformState {
    pub resolution: [f32; 2],
    pub time: f32,
    /// 0 draws flat material colors, 1 multiplies in the vertex colors
    pub vertex_color_mix: f32,
}

impl GlobalUniformState {
    pub fn new(resolution: PhysicalSize<u32>, time: f32, vertex_colors: bool) -> Self {
        Self {
            resolution: [resolution.width as f32, resolution.height as f32],
            time,
            vertex_color_mix: if vertex_colors { 1.0 } else { 0.0 },
        }
    }
}

pub struct GlobalUniform {
    pub buffer: wgpu::Buffer,
}

impl GlobalUniform {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global uniform buffer"),
            contents: bytemuck::cast_slice(&[GlobalUniformState::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self { buffer }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: GlobalUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}
