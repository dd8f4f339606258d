pub mod atlas;
pub mod autotile;
pub mod canvas;
pub mod compositor;

use std::sync::Arc;
use std::time::Instant;

use glam::{IVec2, Vec2};
use image::{Rgba, RgbaImage};

use atlas::{AtlasError, AtlasPair};
use autotile::SubtileIndices;
use canvas::Canvas;

use crate::config::RenderConfig;
use crate::terrain::TerrainGrid;

/// Colour of the cell grid overlay.
pub const GRID_COLOR: Rgba<u8> = Rgba([102, 102, 102, 128]);

/// Grid stroke width in on-screen pixels, before dividing by the sprite size.
const GRID_STROKE_PX: f32 = 0.1;

/// Draws the static terrain layer of a replay.
///
/// The whole map is autotiled and composited once into a prerendered surface
/// (`tile_px` pixels per cell). Each frame only blits that surface and, when
/// enabled, strokes the cell grid on top.
///
/// `redraw` needs `&mut self` and `draw` needs `&self`, so a redraw can never
/// replace the surface while a frame is reading it.
pub struct MapRenderer<G: TerrainGrid> {
    grid: Arc<G>,
    atlases: AtlasPair,
    width: u32,
    height: u32,
    origin: IVec2,
    subtiles: SubtileIndices,
    prerender: RgbaImage,
    /// Settings the renderer was built with; surfaces are allocated through it.
    config: RenderConfig,
    /// Grid stroke width in cell units.
    grid_stroke: f32,
}

impl<G: TerrainGrid> MapRenderer<G> {
    /// Capture the map's geometry and prerender it with `atlases`.
    pub fn new(grid: Arc<G>, atlases: AtlasPair, config: &RenderConfig) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let tile_px = atlases.tile_px();
        let mut renderer = Self {
            origin: grid.origin(),
            grid,
            prerender: config.create_surface(width * tile_px, height * tile_px),
            subtiles: SubtileIndices::new(width, height),
            atlases,
            width,
            height,
            grid_stroke: GRID_STROKE_PX / config.sprite_size,
            config: config.clone(),
        };
        renderer.redraw();
        renderer
    }

    /// Load `roads.png` and `walls.png` from `config.art_dir`, then prerender.
    pub fn load(grid: Arc<G>, config: &RenderConfig) -> Result<Self, AtlasError> {
        let atlases = AtlasPair::from_config(config)?;
        Ok(Self::new(grid, atlases, config))
    }

    /// Rebuild the prerendered surface from the grid's current contents.
    ///
    /// Always a full pass: the sub-tile buffer is recomputed from scratch and
    /// every pixel of the surface is repainted.
    pub fn redraw(&mut self) {
        let start = Instant::now();
        self.width = self.grid.width();
        self.height = self.grid.height();
        self.origin = self.grid.origin();

        self.subtiles = autotile::resolve(self.grid.as_ref());

        let tile_px = self.atlases.tile_px();
        let size = (self.width * tile_px, self.height * tile_px);
        if self.prerender.dimensions() != size {
            self.prerender = self.config.create_surface(size.0, size.1);
        }
        compositor::composite_into(&mut self.prerender, &self.subtiles, &self.atlases);

        log::info!(
            "prerendered {}x{} map at {}px/cell in {:.2?}",
            self.width,
            self.height,
            tile_px,
            start.elapsed()
        );
    }

    /// Draw the terrain layer in cell units: one map cell is one user-space
    /// unit of `canvas`, with cell `(0, 0)` at the user-space origin.
    ///
    /// With `view.show_gridlines` set, interior cell boundaries are stroked:
    /// `width - 1` vertical and `height - 1` horizontal lines, none on the
    /// outer border.
    pub fn draw(&self, canvas: &mut impl Canvas, view: &RenderConfig) {
        let pushed = canvas.transform();
        let inv = 1.0 / self.atlases.tile_px() as f32;
        canvas.scale(inv, inv);
        canvas.draw_image(&self.prerender);
        canvas.set_transform(pushed);

        if !view.show_gridlines {
            return;
        }
        canvas.set_color(GRID_COLOR);
        canvas.set_stroke_width(self.grid_stroke);
        let (w, h) = (self.width as f32, self.height as f32);
        for i in 1..self.width {
            let x = i as f32;
            canvas.stroke_line(Vec2::new(x, 0.0), Vec2::new(x, h));
        }
        for i in 1..self.height {
            let y = i as f32;
            canvas.stroke_line(Vec2::new(0.0, y), Vec2::new(w, y));
        }
    }

    /// Replace the cached surface with an externally prepared background.
    /// It is drawn as-is until the next [`redraw`](Self::redraw).
    pub fn set_prerender(&mut self, background: RgbaImage) {
        self.prerender = background;
    }

    /// Map width in cells.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in cells.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// World-space location of cell `(0, 0)`.
    #[inline]
    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    /// Pixels per map cell in the prerendered surface.
    #[inline]
    pub fn tile_px(&self) -> u32 {
        self.atlases.tile_px()
    }

    /// Pixel size of the prerendered surface, for layout.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width * self.tile_px(), self.height * self.tile_px())
    }

    pub fn prerender(&self) -> &RgbaImage {
        &self.prerender
    }

    pub fn subtiles(&self) -> &SubtileIndices {
        &self.subtiles
    }

    /// Grid stroke width in cell units.
    pub fn grid_stroke(&self) -> f32 {
        self.grid_stroke
    }
}
