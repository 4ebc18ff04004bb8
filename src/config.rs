//! Demo configuration
//!
//! Loaded from (lowest to highest priority):
//! 1. Built-in defaults
//! 2. `cubefield.toml` in the working directory, if present
//! 3. Environment variables (`CUBEFIELD_SECTION__KEY`)

use std::path::Path;

use anyhow::Context;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::effect::EffectController;

pub const CONFIG_FILE: &str = "cubefield.toml";
const ENV_PREFIX: &str = "CUBEFIELD_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub effect: EffectConfig,
    pub rendering: RenderingConfig,
    /// Fixed RNG seed. A fresh random cloud is generated on every run if unset.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "cubefield".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Starting distance from the origin along +Z
    pub distance: f32,
    /// Fraction of the remaining distance covered per 60 Hz frame
    pub pointer_smoothing: f32,
    /// Added to the inverted pointer offset to get the eye height goal
    pub pointer_bias: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 1.0,
            far: 3000.0,
            distance: 1000.0,
            pointer_smoothing: 0.05,
            pointer_bias: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub velocity: f32,
    pub size: f32,
    pub count: u32,
    pub panel_collapsed: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        let effect = EffectController::default();
        Self {
            velocity: effect.velocity,
            size: effect.size,
            count: effect.count,
            panel_collapsed: true,
        }
    }
}

impl EffectConfig {
    pub fn controller(&self) -> EffectController {
        EffectController {
            velocity: self.velocity,
            size: self.size,
            count: self.count,
        }
        .clamped()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Linear RGBA
    pub clear_color: [f64; 4],
    /// Tint the mesh colors with the per-corner cube colors
    pub vertex_colors: bool,
    /// Recompile shaders in `assets/shaders` when they change on disk
    pub shader_hot_reload: bool,
    pub vsync: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            vertex_colors: false,
            shader_hot_reload: false,
            vsync: true,
        }
    }
}

impl DemoConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut figment = Figment::from(Serialized::defaults(DemoConfig::default()));

        if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        // CUBEFIELD_EFFECT__COUNT=64 -> effect.count = 64
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: DemoConfig = figment
            .extract()
            .context("Failed to parse configuration")?;

        let effect = config.effect.controller();
        config.effect.velocity = effect.velocity;
        config.effect.size = effect.size;
        config.effect.count = effect.count;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let config = DemoConfig::load().expect("load defaults");
            assert_eq!(config, DemoConfig::default());
            assert_eq!(config.seed, None);
            assert!(config.effect.panel_collapsed);
            Ok(())
        });
    }

    #[test]
    fn file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                seed = 42

                [window]
                title = "Cubes"

                [effect]
                count = 12
                size = 0.5
                "#,
            )?;

            let config = DemoConfig::load().expect("load file");
            assert_eq!(config.seed, Some(42));
            assert_eq!(config.window.title, "Cubes");
            assert_eq!(config.window.width, 1280);
            assert_eq!(config.effect.count, 12);
            assert_eq!(config.effect.size, 0.5);
            assert_eq!(config.effect.velocity, 1.0);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[effect]\ncount = 12\n")?;
            jail.set_env("CUBEFIELD_EFFECT__COUNT", "64");
            jail.set_env("CUBEFIELD_RENDERING__VERTEX_COLORS", "true");

            let config = DemoConfig::load().expect("load env");
            assert_eq!(config.effect.count, 64);
            assert!(config.rendering.vertex_colors);
            Ok(())
        });
    }

    #[test]
    fn effect_values_are_clamped() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[effect]\ncount = 5000\nvelocity = 7.5\n")?;

            let config = DemoConfig::load().expect("load clamped");
            assert_eq!(config.effect.count, 256);
            assert_eq!(config.effect.velocity, 2.0);
            Ok(())
        });
    }

    #[test]
    fn invalid_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[effect]\ncount = \"many\"\n")?;
            assert!(DemoConfig::load().is_err());
            Ok(())
        });
    }
}
