use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

/// Position, Euler XYZ rotation and uniform scale with a lazily rebuilt model
/// matrix.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,
    scale: f32,

    matrix: RefCell<Mat4>,
    dirty: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
            scale: 1.0,
            matrix: RefCell::new(Mat4::IDENTITY),
            dirty: Cell::new(true),
        }
    }

    pub fn matrix(&self) -> Ref<Mat4> {
        if self.dirty.get() {
            let matrix = Mat4::from_scale_rotation_translation(
                Vec3::splat(self.scale),
                self.quat(),
                self.translation,
            );

            self.matrix.replace(matrix);
            self.dirty.set(false);
        }

        self.matrix.borrow()
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    fn invalidate(&self) {
        self.dirty.set(true);
    }

    #[allow(dead_code)]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    #[allow(dead_code)]
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate();
    }

    pub fn set_translation_x(&mut self, x: f32) {
        self.translation.x = x;
        self.invalidate();
    }

    pub fn set_translation_y(&mut self, y: f32) {
        self.translation.y = y;
        self.invalidate();
    }

    pub fn set_rotation_x(&mut self, angle: f32) {
        self.rotation.x = angle;
        self.invalidate();
    }

    pub fn set_rotation_y(&mut self, angle: f32) {
        self.rotation.y = angle;
        self.invalidate();
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.invalidate();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Euler angles in radians, applied X, then Y, then Z.
    #[allow(dead_code)]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[allow(dead_code)]
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_rebuilt_after_change() {
        let mut transform = Transform::default();
        assert_eq!(*transform.matrix(), Mat4::IDENTITY);
        assert!(!transform.is_dirty());

        transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(transform.is_dirty());
        assert_eq!(
            transform.matrix().transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert!(!transform.is_dirty());
    }

    #[test]
    fn scale_then_rotate_then_translate() {
        let mut transform = Transform::default();
        transform.set_scale(2.0);
        transform.set_rotation_y(std::f32::consts::FRAC_PI_2);
        transform.set_translation_x(10.0);

        let point = transform.matrix().transform_point3(Vec3::X);
        // X scaled to 2, rotated a quarter turn around Y to -Z, then moved
        assert!((point - Vec3::new(10.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn axis_setters_leave_other_axes() {
        let mut transform = Transform::default();
        transform.set_rotation_y(0.5);
        transform.set_rotation_x(0.25);
        assert_eq!(transform.rotation(), Vec3::new(0.25, 0.5, 0.0));

        transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        transform.set_translation_y(-4.0);
        assert_eq!(transform.translation(), Vec3::new(1.0, -4.0, 3.0));
    }
}
