pub mod global_uniform;
pub mod imgui_renderer;
pub mod instance;
pub mod mesh_buffers;
pub mod passes;
pub mod render_camera;
pub mod render_common;
pub mod renderer;
pub mod shader_loader;
pub mod texture;
