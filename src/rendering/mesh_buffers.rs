use std::mem::offset_of;

use wgpu::util::DeviceExt;

use crate::geometry::{Geometry, Vertex};

/// GPU copy of the scene's shared geometry.
pub struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    num_indices: u32,
    generation: u64,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device, geometry: &Geometry, generation: u64) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Cube cloud vertices (generation {})", generation)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Cube cloud indices (generation {})", generation)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertices,
            indices,
            num_indices: geometry.indices.len() as u32,
            generation,
        }
    }

    /// Re-uploads the geometry if the scene replaced it since the last upload.
    /// The previous buffers are destroyed right away.
    pub fn sync(&mut self, device: &wgpu::Device, geometry: &Geometry, generation: u64) {
        if generation == self.generation {
            return;
        }

        let previous = std::mem::replace(self, Self::new(device, geometry, generation));
        previous.destroy();

        log::debug!(
            "Uploaded cube cloud generation {} ({} indices)",
            generation,
            self.num_indices
        );
    }

    fn destroy(self) {
        self.vertices.destroy();
        self.indices.destroy();
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertices.slice(..));
        render_pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
    }

    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }
}

pub const CUBE_CLOUD_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
    ],
};
