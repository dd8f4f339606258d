use image::{RgbaImage, imageops};

use super::atlas::AtlasPair;
use super::autotile::{SUBTILES, SubtileIndices};

/// Paint every sub-cell of `indices` into `surface`.
///
/// Sub-cell `(sx, sy)` of cell `(x, y)` lands at pixel
/// `((4x + sx) · frag, (4y + sy) · frag)` with `frag = tile_px / 4`. Every
/// pixel of the map area is overwritten, so repeating the pass on unchanged
/// input yields an identical surface.
///
/// # Panics
/// Panics if `surface` is not exactly `width · tile_px × height · tile_px`.
pub fn composite_into(surface: &mut RgbaImage, indices: &SubtileIndices, atlases: &AtlasPair) {
    let tile_px = atlases.tile_px();
    let frag_px = tile_px / SUBTILES;
    let expected = (indices.width() * tile_px, indices.height() * tile_px);
    assert_eq!(surface.dimensions(), expected, "prerender surface has the wrong size");

    for x in 0..indices.width() {
        for y in 0..indices.height() {
            for sx in 0..SUBTILES {
                for sy in 0..SUBTILES {
                    let subtile = indices.get(x, y, sx, sy);
                    let fragment = atlases.get(subtile.style).variant_fragment(subtile.variant, sx, sy);
                    let px = ((SUBTILES * x + sx) * frag_px) as i64;
                    let py = ((SUBTILES * y + sy) * frag_px) as i64;
                    // Fragments tile the surface exactly; no blending.
                    imageops::replace(surface, fragment, px, py);
                }
            }
        }
    }
}

/// Allocate a surface for `indices` and composite into it.
pub fn composite(indices: &SubtileIndices, atlases: &AtlasPair) -> RgbaImage {
    let tile_px = atlases.tile_px();
    let mut surface = RgbaImage::new(indices.width() * tile_px, indices.height() * tile_px);
    composite_into(&mut surface, indices, atlases);
    surface
}

// ── Tests ─────────────────────────────────────────────────────────────────────
