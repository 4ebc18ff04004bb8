use std::f32::consts::PI;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    camera::Camera,
    color::Color,
    config::DemoConfig,
    effect::EffectController,
    geometry::generate_cube_cloud,
    scene_graph::{BasicMaterial, Object3D, Scene, Transform},
};

const PALETTE: [u32; 8] = [
    0xff57b2, 0x7b1fa2, 0x4fc3f7, 0xff9800, 0x4caf50, 0x9c27b0, 0x009688, 0xffeb3b,
];
const ORIGINAL_SCALES: [f32; 8] = [0.5, 0.5, 0.75, 1.0, 1.25, 3.0, 3.5, 4.5];

/// Meshes below this index spin around X, the rest around Y.
const INNER_MESHES: usize = 4;
/// Animation phase advanced per millisecond at velocity 1.
const PHASE_PER_MS: f32 = 0.0002;
const SWAY_AMPLITUDE: f32 = 500.0;

pub struct DemoState {
    pub camera: Camera,
    pub scene: Scene,
    pub effect: EffectController,
    pub panel_collapsed: bool,
    pub vertex_colors: bool,
    rng: StdRng,
    phase: f32,
    pointer_y: f32,
    half_height: f32,
    scale_factor: f32,
}

impl DemoState {
    pub fn new(config: &DemoConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let width = config.window.width.max(1);
        let height = config.window.height.max(1);
        let camera = Camera::new(&config.camera, width as f32 / height as f32);

        let effect = config.effect.controller();
        let geometry = generate_cube_cloud(&effect.cloud_params(), &mut rng);
        let mut scene = Scene::new(geometry);

        let meshes = PALETTE.into_iter().zip(ORIGINAL_SCALES);

        for (i, (hex, original_scale)) in meshes.enumerate() {
            let mut transform = Transform::default();
            transform.set_rotation_y(rng.gen::<f32>() * PI);

            scene.add_object(Object3D {
                name: format!("Cube cloud {}", i),
                transform,
                material: BasicMaterial {
                    color: Color::from_hex(hex).rgb(),
                    opacity: (rng.gen::<f32>() + 0.2).min(1.0),
                },
                original_scale,
            });
        }

        log::info!(
            "Scene ready: {} meshes sharing {} cubes",
            scene.len(),
            scene.geometry().cube_count()
        );

        Self {
            camera,
            scene,
            effect,
            panel_collapsed: config.effect.panel_collapsed,
            vertex_colors: config.rendering.vertex_colors,
            rng,
            phase: 0.0,
            pointer_y: 0.0,
            half_height: height as f32 / 2.0,
            scale_factor: 1.0,
        }
    }

    /// `y` in physical pixels from the top of the window. The offset from
    /// the middle is stored in logical pixels.
    pub fn on_pointer_moved(&mut self, y: f32) {
        self.pointer_y = (y - self.half_height) / self.scale_factor;
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor as f32;
        }
    }

    pub fn on_resized(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.half_height = height as f32 / 2.0;
        self.camera.set_aspect(width, height);
    }

    /// Builds a fresh cube cloud from the current parameters and hands it to
    /// every mesh.
    pub fn regenerate(&mut self) {
        let params = self.effect.cloud_params();
        let geometry = generate_cube_cloud(&params, &mut self.rng);

        log::info!(
            "Regenerated {} cubes on a shell of radius {}",
            params.count,
            params.shell_radius
        );

        self.scene.replace_geometry(geometry);
    }

    pub fn time(&self) -> f32 {
        self.phase
    }

    pub fn update(&mut self, dt: Duration) {
        self.phase += dt.as_secs_f32() * 1000.0 * PHASE_PER_MS * self.effect.velocity;
        let time = self.phase;

        self.camera.follow_pointer(self.pointer_y, dt.as_secs_f32());

        let sway = (time * 2.0).sin() * SWAY_AMPLITUDE;
        let pulse = 1.0 + 0.5 * (8.0 * time).sin();
        let rng = &mut self.rng;

        for (i, (_, object)) in self.scene.objects_mut().enumerate() {
            let spin = time * (i + 1) as f32;
            if i < INNER_MESHES {
                object.transform.set_rotation_x(spin);
            } else {
                object.transform.set_rotation_y(spin);
            }

            let mut jitter = || rng.gen::<f32>() * 2.0 - 4.0;
            object.transform.set_translation_x(sway + jitter());
            object.transform.set_translation_y(sway + jitter());

            let scale = object.original_scale * (i as f32 / 8.0 + 1.0) * pulse;
            object.transform.set_scale(scale);
        }
    }

    #[allow(dead_code)]
    pub fn pointer_y(&self) -> f32 {
        self.pointer_y
    }
}
