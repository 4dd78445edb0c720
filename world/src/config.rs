//! World configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! stock layout: a browser window with the URL bar above it, and the
//! tray floating just below eye level.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::vr::scene::{Mat4, Vec3};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Touch-drag delta (normalized touchpad units) to scroll pixels.
    pub scroll_factor: f32,
    /// World units per density-independent pixel.
    pub world_dpi_ratio: f32,
    /// Device pixels per density-independent pixel.
    pub display_density: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Emit the listener pose every frame.
    pub audio_pose: bool,
    pub browser: WindowConfig,
    pub url_bar: WindowConfig,
    pub tray: TrayConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            scroll_factor: 20.0,
            world_dpi_ratio: 18.0 / 720.0,
            display_density: 1.0,
            near_clip: 0.1,
            far_clip: 100.0,
            audio_pose: true,
            browser: WindowConfig {
                width: 720.0,
                height: 450.0,
                position: [0.0, -3.0, -18.0],
            },
            url_bar: WindowConfig {
                width: 720.0,
                height: 103.0,
                position: [0.0, 7.15, -18.0],
            },
            tray: TrayConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        anyhow::ensure!(
            config.display_density > 0.0,
            "display_density must be positive, got {}",
            config.display_density
        );
        anyhow::ensure!(
            config.near_clip < config.far_clip,
            "near_clip ({}) must be below far_clip ({})",
            config.near_clip,
            config.far_clip
        );
        Ok(config)
    }

    /// World units per device pixel.
    pub fn world_per_pixel(&self) -> f32 {
        self.world_dpi_ratio / self.display_density
    }

    /// Convert a dp length to device pixels.
    pub fn to_pixels(&self, dp: f32) -> u32 {
        (dp * self.display_density) as u32
    }
}

/// Size (dp) and position of a default window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub position: [f32; 3],
}

impl WindowConfig {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// World width; the height follows the pixel aspect.
    pub world_width: f32,
    pub position: [f32; 3],
    /// Tilt toward the viewer about +X, in degrees.
    pub tilt: f32,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            pixel_width: 500,
            pixel_height: 100,
            world_width: 0.5,
            position: [0.0, 0.45, -1.2],
            tilt: 30.0,
        }
    }
}

impl TrayConfig {
    pub fn world_per_pixel(&self) -> f32 {
        if self.pixel_width == 0 {
            return 0.0;
        }
        self.world_width / self.pixel_width as f32
    }

    /// Tilt first, then move into place.
    pub fn transform(&self) -> Mat4 {
        let [x, y, z] = self.position;
        Mat4::translation(x, y, z).mul(&Mat4::rotation(
            Vec3::new(1.0, 0.0, 0.0),
            self.tilt.to_radians(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = WorldConfig::from_toml("").unwrap();
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.scroll_factor, 20.0);
        assert!((config.world_per_pixel() - 0.025).abs() < 1e-7);
    }

    #[test]
    fn test_partial_override() {
        let config = WorldConfig::from_toml(
            r#"
            display_density = 2.0
            scroll_factor = 10.0

            [browser]
            width = 360.0
            height = 200.0
            position = [0.0, 0.0, -5.0]

            [tray]
            tilt = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.scroll_factor, 10.0);
        assert_eq!(config.to_pixels(360.0), 720);
        assert!((config.world_per_pixel() - 0.0125).abs() < 1e-7);
        assert_eq!(config.browser.position(), Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(config.tray.pixel_width, 500);
        assert_eq!(config.url_bar, WorldConfig::default().url_bar);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(WorldConfig::from_toml("display_density = 0.0").is_err());
        assert!(WorldConfig::from_toml("near_clip = 200.0").is_err());
        assert!(WorldConfig::from_toml("scroll_factor = \"fast\"").is_err());
    }

    #[test]
    fn test_tray_geometry() {
        let tray = TrayConfig::default();
        assert!((tray.world_per_pixel() - 0.001).abs() < 1e-7);
        let origin = tray.transform().get_translation();
        assert!((origin - Vec3::new(0.0, 0.45, -1.2)).length() < 1e-6);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "far_clip = 50.0").unwrap();
        let config = WorldConfig::load(file.path()).unwrap();
        assert_eq!(config.far_clip, 50.0);

        assert!(WorldConfig::load(Path::new("/nonexistent/world.toml")).is_err());
    }
}
