use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Frame duration the pointer smoothing factor is tuned for.
const REFERENCE_FRAME_SECS: f32 = 1.0 / 60.0;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pointer_smoothing: f32,
    pointer_bias: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, config.distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
            pointer_smoothing: config.pointer_smoothing,
            pointer_bias: config.pointer_bias,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }

        self.aspect = width as f32 / height as f32;
    }

    /// Eases the eye height toward the pointer and keeps looking at the scene
    /// origin. `pointer_y` is relative to the middle of the window, down is
    /// positive.
    pub fn follow_pointer(&mut self, pointer_y: f32, dt: f32) {
        let goal = -pointer_y + self.pointer_bias;
        let frames = dt / REFERENCE_FRAME_SECS;
        let factor = 1.0 - (1.0 - self.pointer_smoothing).powf(frames);

        self.eye.y += (goal - self.eye.y) * factor;
        self.target = Vec3::ZERO;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance along the view direction, larger is further away.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.view_matrix().transform_point3(point).z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn starts_in_front_of_origin() {
        let camera = camera();
        assert_eq!(camera.eye, Vec3::new(0.0, 0.0, 1000.0));
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.far, 3000.0);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut camera = camera();
        camera.set_aspect(800, 400);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn zero_height_keeps_previous_aspect() {
        let mut camera = camera();
        camera.set_aspect(800, 400);
        camera.set_aspect(800, 0);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn one_reference_frame_moves_by_smoothing_factor() {
        let mut camera = camera();
        camera.follow_pointer(0.0, REFERENCE_FRAME_SECS);
        // goal is -0 + 200, 5% of the way there
        assert!((camera.eye.y - 10.0).abs() < 1e-3);
    }

    #[test]
    fn converges_to_pointer_goal() {
        let mut camera = camera();
        for _ in 0..1000 {
            camera.follow_pointer(300.0, REFERENCE_FRAME_SECS);
        }
        assert!((camera.eye.y - (-100.0)).abs() < 0.01);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = camera();
        let clip = camera.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn view_depth_grows_away_from_eye() {
        let camera = camera();
        assert!((camera.view_depth(Vec3::ZERO) - 1000.0).abs() < 1e-3);
        assert!(camera.view_depth(Vec3::new(0.0, 0.0, -500.0)) > camera.view_depth(Vec3::ZERO));
    }
}
