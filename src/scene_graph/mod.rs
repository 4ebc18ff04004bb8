pub mod object3d;
pub mod scene;
pub mod transform;

pub use object3d::{BasicMaterial, Object3D};
pub use scene::Scene;
pub use transform::Transform;
