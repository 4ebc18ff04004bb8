use std::mem::offset_of;

use glam::{Mat4, Vec4};
use wgpu::BufferUsages;

use crate::{
    camera::Camera,
    scene_graph::{Object3D, Scene},
};

/// This should match `InstanceInput` in `cube_cloud.wgsl`
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub model_matrix: Mat4,
    /// Linear RGB material color, opacity in w
    pub color: Vec4,
}

impl InstanceData {
    pub fn from_object(object: &Object3D) -> Self {
        Self {
            model_matrix: *object.transform.matrix(),
            color: object.material.color.extend(object.material.opacity),
        }
    }
}

/// Instance data for every mesh in the scene, furthest from the camera first.
pub fn gather_instances(scene: &Scene, camera: &Camera) -> Vec<InstanceData> {
    scene
        .back_to_front(|position| camera.view_depth(position))
        .into_iter()
        .filter_map(|id| scene.get_object(id))
        .map(InstanceData::from_object)
        .collect()
}

pub struct InstanceBuffer(wgpu::Buffer);

impl InstanceBuffer {
    pub const MAX_INSTANCES: u64 = 128;

    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance buffer"),
            size: std::mem::size_of::<InstanceData>() as u64 * Self::MAX_INSTANCES,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self(buffer)
    }

    /// Writes as many instances as fit and returns how many were written.
    pub fn write(&self, queue: &wgpu::Queue, instances: &[InstanceData]) -> u32 {
        let count = instances.len().min(Self::MAX_INSTANCES as usize);
        if count < instances.len() {
            log::warn!(
                "Dropping {} instances over the buffer capacity",
                instances.len() - count
            );
        }

        queue.write_buffer(&self.0, 0, bytemuck::cast_slice(&instances[..count]));
        count as u32
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.0.slice(..));
    }
}

const MATRIX_COLUMN: wgpu::BufferAddress = std::mem::size_of::<Vec4>() as wgpu::BufferAddress;

pub const INSTANCE_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(InstanceData, model_matrix) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(InstanceData, model_matrix) as wgpu::BufferAddress + MATRIX_COLUMN,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(InstanceData, model_matrix) as wgpu::BufferAddress
                + MATRIX_COLUMN * 2,
            shader_location: 4,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(InstanceData, model_matrix) as wgpu::BufferAddress
                + MATRIX_COLUMN * 3,
            shader_location: 5,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(InstanceData, color) as wgpu::BufferAddress,
            shader_location: 6,
            format: wgpu::VertexFormat::Float32x4,
        },
    ],
};
