use glam::Vec3;

/// Linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Vec3);

impl Color {
    /// Parses an sRGB `0xRRGGBB` value into linear RGB.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self(Vec3::new(channel(16), channel(8), channel(0)))
    }

    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        Self(hsl_to_rgb(h, s, l))
    }

    pub fn rgb(&self) -> Vec3 {
        self.0
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// All inputs in `[0, 1]`; hue wraps around.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Vec3::new(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < 1e-4, "{a} != {b}");
    }

    #[test]
    fn hsl_primaries() {
        assert_close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::X);
        assert_close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::Y);
        assert_close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::Z);
    }

    #[test]
    fn hsl_without_saturation_is_grey() {
        assert_close(hsl_to_rgb(0.7, 0.0, 0.25), Vec3::splat(0.25));
    }

    #[test]
    fn hsl_lightness_extremes() {
        assert_close(hsl_to_rgb(0.3, 0.8, 0.0), Vec3::ZERO);
        assert_close(hsl_to_rgb(0.3, 0.8, 1.0), Vec3::ONE);
    }

    #[test]
    fn hex_is_converted_to_linear() {
        assert_close(Color::from_hex(0xffffff).rgb(), Vec3::ONE);
        assert_close(Color::from_hex(0x000000).rgb(), Vec3::ZERO);

        let grey = Color::from_hex(0x808080).rgb();
        assert!((grey.x - 0.2158).abs() < 1e-3);
        assert_eq!(grey.x, grey.z);
    }

    #[test]
    fn hex_channel_order() {
        let c = Color::from_hex(0xff0000).rgb();
        assert_close(c, Vec3::X);
    }
}
