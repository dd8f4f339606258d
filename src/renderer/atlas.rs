use std::path::{Path, PathBuf};

use image::{RgbaImage, imageops};

use super::autotile::{SUBTILES, TileStyle, VARIANTS, Variant};
use crate::config::RenderConfig;

/// Fragment columns in a sliced atlas: every master variant is 4 sub-cells wide.
pub const ATLAS_COLUMNS: u32 = VARIANTS * SUBTILES;

// ── AtlasError ────────────────────────────────────────────────────────────────

/// Load-time failure of a tile atlas. None of these are recoverable; the
/// caller is expected to surface them as a configuration problem.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("failed to load atlas {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("atlas width {width}px is not divisible into 12 fragment columns")]
    NotDivisible { width: u32 },

    #[error("atlas is {width}x{height}px; each of its 3 master tiles must be square")]
    NotSquare { width: u32, height: u32 },

    #[error("road atlas tiles are {road}px but wall atlas tiles are {void}px")]
    SizeMismatch { road: u32, void: u32 },
}

// ── TileAtlas ─────────────────────────────────────────────────────────────────

/// One autotile style, pre-sliced into `12 × 4` fragments.
///
/// The source image holds the three master variants side by side:
/// ```text
/// +--------+--------+--------+
/// | empty  |  edge  | corner |   each master is `tile_px` square
/// +--------+--------+--------+
/// ```
/// and each master is cut into a 4×4 grid of `tile_px / 4` fragments.
/// Fragment `(column, row)` with `column = variant * 4 + local_column`.
#[derive(Debug)]
pub struct TileAtlas {
    fragments: Vec<RgbaImage>,
    tile_px: u32,
}

impl TileAtlas {
    /// Decode the PNG at `path` and slice it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| AtlasError::Load { path: path.to_path_buf(), source })?
            .to_rgba8();
        let atlas = Self::from_image(img)?;
        log::info!("loaded tile atlas {} ({}px tiles)", path.display(), atlas.tile_px);
        Ok(atlas)
    }

    /// Slice an already decoded atlas image. The image is consumed; only the
    /// fragments are kept.
    pub fn from_image(img: RgbaImage) -> Result<Self, AtlasError> {
        let (img_w, img_h) = img.dimensions();
        if img_w == 0 || img_w % ATLAS_COLUMNS != 0 {
            return Err(AtlasError::NotDivisible { width: img_w });
        }
        let tile_px = img_w / VARIANTS;
        if img_h != tile_px {
            return Err(AtlasError::NotSquare { width: img_w, height: img_h });
        }

        let frag_px = tile_px / SUBTILES;
        let mut fragments = Vec::with_capacity((ATLAS_COLUMNS * SUBTILES) as usize);
        for col in 0..ATLAS_COLUMNS {
            for row in 0..SUBTILES {
                fragments.push(
                    imageops::crop_imm(&img, col * frag_px, row * frag_px, frag_px, frag_px)
                        .to_image(),
                );
            }
        }

        Ok(Self { fragments, tile_px })
    }

    /// Pixel size of one whole map cell (one master tile).
    #[inline]
    pub fn tile_px(&self) -> u32 {
        self.tile_px
    }

    /// Pixel size of one fragment (one sub-cell).
    #[inline]
    pub fn fragment_px(&self) -> u32 {
        self.tile_px / SUBTILES
    }

    /// Fragment at sliced position `(column, row)`.
    ///
    /// # Panics
    /// Panics if `column >= 12` or `row >= 4`.
    pub fn fragment(&self, column: u32, row: u32) -> &RgbaImage {
        assert!(
            column < ATLAS_COLUMNS && row < SUBTILES,
            "atlas fragment ({column}, {row}) out of range"
        );
        &self.fragments[(column * SUBTILES + row) as usize]
    }

    /// Fragment for sub-cell `(sx, sy)` of a cell drawn with `variant`.
    #[inline]
    pub fn variant_fragment(&self, variant: Variant, sx: u32, sy: u32) -> &RgbaImage {
        assert!(sx < SUBTILES, "sub-cell column {sx} out of range");
        self.fragment(variant as u32 * SUBTILES + sx, sy)
    }
}

// ── AtlasPair ─────────────────────────────────────────────────────────────────

/// The road and wall atlases, guaranteed to share one tile size.
#[derive(Debug)]
pub struct AtlasPair {
    road: TileAtlas,
    void: TileAtlas,
}

impl AtlasPair {
    pub fn new(road: TileAtlas, void: TileAtlas) -> Result<Self, AtlasError> {
        if road.tile_px != void.tile_px {
            return Err(AtlasError::SizeMismatch { road: road.tile_px, void: void.tile_px });
        }
        Ok(Self { road, void })
    }

    pub fn load(road_path: impl AsRef<Path>, void_path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        Self::new(TileAtlas::load(road_path)?, TileAtlas::load(void_path)?)
    }

    /// Load `roads.png` and `walls.png` from `config.art_dir`.
    pub fn from_config(config: &RenderConfig) -> Result<Self, AtlasError> {
        Self::load(config.roads_path(), config.walls_path())
    }

    #[inline]
    pub fn get(&self, style: TileStyle) -> &TileAtlas {
        match style {
            TileStyle::Road => &self.road,
            TileStyle::Void => &self.void,
        }
    }

    #[inline]
    pub fn tile_px(&self) -> u32 {
        self.road.tile_px
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
