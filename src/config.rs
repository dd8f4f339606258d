use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

// ── ConfigError ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read render config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed render config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sprite_size must be positive, got {0}")]
    SpriteSize(f32),
}

// ── RenderConfig ──────────────────────────────────────────────────────────────

/// Render settings shared by the map renderer and the layers drawn above it.
///
/// Passed explicitly into [`MapRenderer::new`](crate::renderer::MapRenderer::new)
/// and [`MapRenderer::draw`](crate::renderer::MapRenderer::draw); there is no
/// process-wide instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Stroke cell boundaries on top of the map.
    pub show_gridlines: bool,
    /// On-screen pixels per map cell. Grid strokes are `0.1 / sprite_size`
    /// cells wide so they stay a tenth of a pixel regardless of zoom.
    pub sprite_size: f32,
    /// Directory holding `roads.png` and `walls.png`.
    pub art_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_gridlines: false,
            sprite_size: 32.0,
            art_dir: PathBuf::from("art"),
        }
    }
}

impl RenderConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        if cfg.sprite_size.is_nan() || cfg.sprite_size <= 0.0 {
            return Err(ConfigError::SpriteSize(cfg.sprite_size));
        }
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn roads_path(&self) -> PathBuf {
        self.art_dir.join("roads.png")
    }

    pub fn walls_path(&self) -> PathBuf {
        self.art_dir.join("walls.png")
    }

    /// Allocate a fully transparent surface in the pixel format the map
    /// compositor and [`RasterCanvas`](crate::renderer::canvas::RasterCanvas)
    /// draw into.
    pub fn create_surface(&self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::new(width, height)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
