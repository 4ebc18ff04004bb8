use crate::geometry::CubeCloudParams;

pub const VELOCITY_RANGE: (f32, f32) = (0.0, 2.0);
pub const SIZE_RANGE: (f32, f32) = (0.0, 2.0);
pub const COUNT_RANGE: (u32, u32) = (1, 256);
/// Sliders move in hundredths
const FLOAT_STEPS_PER_UNIT: f32 = 100.0;

const SHELL_RADIUS_PER_SIZE: f32 = 256.0;
const CUBE_EXTENT_PER_SIZE: f32 = 16.0;

/// User tunable parameters, edited through the floating panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectController {
    pub velocity: f32,
    pub size: f32,
    pub count: u32,
}

impl Default for EffectController {
    fn default() -> Self {
        Self {
            velocity: 1.0,
            size: 1.0,
            count: 100,
        }
    }
}

fn snap(value: f32, (min, max): (f32, f32)) -> f32 {
    let value = if value.is_finite() { value } else { min };
    let snapped = (value.clamp(min, max) * FLOAT_STEPS_PER_UNIT).round() / FLOAT_STEPS_PER_UNIT;
    snapped.clamp(min, max)
}

impl EffectController {
    pub fn clamped(self) -> Self {
        Self {
            velocity: snap(self.velocity, VELOCITY_RANGE),
            size: snap(self.size, SIZE_RANGE),
            count: self.count.clamp(COUNT_RANGE.0, COUNT_RANGE.1),
        }
    }

    pub fn cloud_params(&self) -> CubeCloudParams {
        CubeCloudParams {
            count: self.count,
            shell_radius: SHELL_RADIUS_PER_SIZE * self.size,
            cube_extent: CUBE_EXTENT_PER_SIZE * self.size,
        }
    }

    /// Draws the parameter panel. Returns true if any value was changed.
    pub fn draw_panel(&mut self, ui: &imgui::Ui, start_collapsed: bool) -> bool {
        let mut changed = false;

        ui.window("Controls")
            .position([8.0, 8.0], imgui::Condition::FirstUseEver)
            .size([260.0, 110.0], imgui::Condition::FirstUseEver)
            .collapsed(start_collapsed, imgui::Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                changed |= ui
                    .slider_config("velocity", VELOCITY_RANGE.0, VELOCITY_RANGE.1)
                    .display_format("%.2f")
                    .build(&mut self.velocity);
                changed |= ui
                    .slider_config("size", SIZE_RANGE.0, SIZE_RANGE.1)
                    .display_format("%.2f")
                    .build(&mut self.size);
                changed |= ui.slider("count", COUNT_RANGE.0, COUNT_RANGE.1, &mut self.count);
            });

        if changed {
            *self = self.clamped();
        }

        changed
    }
}
