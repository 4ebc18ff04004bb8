use glam::Vec3;
use id_arena::Id;

use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// Unlit flat color with constant opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMaterial {
    /// Linear RGB
    pub color: Vec3,
    pub opacity: f32,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
        }
    }
}

/// A mesh drawn with the scene's shared geometry.
#[derive(Debug, Clone, Default)]
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub material: BasicMaterial,
    /// Base factor the per-frame scale animation multiplies
    pub original_scale: f32,
}
