use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::{Affine2, Vec2};

use battlemap::renderer::canvas::RasterCanvas;
use battlemap::{GameMap, MapRenderer, RenderConfig};

/// Prerender a battlefield map and write one frame of it as a PNG.
#[derive(Parser, Debug)]
#[command(name = "battlemap", version, about)]
struct Cli {
    /// Map JSON (`width`, `height`, `origin`, `rows`).
    map: PathBuf,

    /// Output PNG path.
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Render config JSON; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding roads.png and walls.png (overrides the config).
    #[arg(long)]
    art_dir: Option<PathBuf>,

    /// Stroke cell gridlines (overrides the config).
    #[arg(long)]
    gridlines: bool,

    /// Output pixels per map cell (defaults to the config's sprite size).
    #[arg(long)]
    scale: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading render config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(dir) = cli.art_dir {
        config.art_dir = dir;
    }
    if cli.gridlines {
        config.show_gridlines = true;
    }
    if let Some(scale) = cli.scale {
        anyhow::ensure!(scale > 0.0, "--scale must be positive, got {scale}");
        config.sprite_size = scale;
    }

    let map = GameMap::load(&cli.map)
        .with_context(|| format!("loading map {}", cli.map.display()))?;
    let renderer = MapRenderer::load(Arc::new(map), &config)
        .with_context(|| format!("loading tile art from {}", config.art_dir.display()))?;

    let scale = config.sprite_size;
    let frame_w = (renderer.width() as f32 * scale).round() as u32;
    let frame_h = (renderer.height() as f32 * scale).round() as u32;
    let target = config.create_surface(frame_w, frame_h);
    let mut canvas = RasterCanvas::new(target, Affine2::from_scale(Vec2::splat(scale)));
    renderer.draw(&mut canvas, &config);

    canvas
        .into_image()
        .save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    log::info!("wrote {}x{} frame to {}", frame_w, frame_h, cli.output.display());
    Ok(())
}
