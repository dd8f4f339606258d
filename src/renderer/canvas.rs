// ── Canvas ────────────────────────────────────────────────────────────────────
//
// The draw-time surface the map renderer paints onto each frame. The frame
// composition layer owns the canvas and its base transform (usually cell
// units → screen pixels); the map renderer only pushes a scale, blits and
// strokes lines.

use glam::{Affine2, Vec2};
use image::{Rgba, RgbaImage};

/// Draw-time callbacks consumed by [`MapRenderer::draw`](super::MapRenderer::draw).
pub trait Canvas {
    /// Current user-space → device transform.
    fn transform(&self) -> Affine2;

    fn set_transform(&mut self, transform: Affine2);

    /// Post-multiply the current transform by a scale.
    fn scale(&mut self, sx: f32, sy: f32) {
        let t = self.transform() * Affine2::from_scale(Vec2::new(sx, sy));
        self.set_transform(t);
    }

    /// Draw `image` with its top-left corner at the user-space origin, one
    /// image pixel per user-space unit.
    fn draw_image(&mut self, image: &RgbaImage);

    fn set_color(&mut self, color: Rgba<u8>);

    /// Stroke width in user-space units.
    fn set_stroke_width(&mut self, width: f32);

    fn stroke_line(&mut self, from: Vec2, to: Vec2);
}

// ── RasterCanvas ──────────────────────────────────────────────────────────────

/// Software [`Canvas`] over an RGBA image: nearest-neighbour blits and
/// source-over blended strokes.
pub struct RasterCanvas {
    target: RgbaImage,
    transform: Affine2,
    color: Rgba<u8>,
    stroke_width: f32,
}

impl RasterCanvas {
    /// Thinnest stroke that still covers a pixel, in device pixels.
    const MIN_STROKE_PX: f32 = 1.0;

    /// Wrap `target`, drawing through `base` (user space → target pixels).
    pub fn new(target: RgbaImage, base: Affine2) -> Self {
        Self {
            target,
            transform: base,
            color: Rgba([0, 0, 0, 255]),
            stroke_width: 1.0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_image(self) -> RgbaImage {
        self.target
    }

    /// Device-pixel rectangle `[x0, x1) × [y0, y1)` covering `points`, clipped
    /// to the target. `None` when nothing is visible.
    fn device_bounds(&self, points: &[Vec2], pad: f32) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = self.target.dimensions();
        let min = points.iter().fold(Vec2::splat(f32::INFINITY), |a, p| a.min(*p)) - pad;
        let max = points.iter().fold(Vec2::splat(f32::NEG_INFINITY), |a, p| a.max(*p)) + pad;

        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(w);
        let y1 = (max.y.ceil().max(0.0) as u32).min(h);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    fn blend(&mut self, x: u32, y: u32, src: Rgba<u8>) {
        let dst = self.target.get_pixel_mut(x, y);
        *dst = blend_over(*dst, src);
    }
}

impl Canvas for RasterCanvas {
    fn transform(&self) -> Affine2 {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine2) {
        self.transform = transform;
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 {
            return;
        }
        let corners = [
            Vec2::ZERO,
            Vec2::new(iw as f32, 0.0),
            Vec2::new(0.0, ih as f32),
            Vec2::new(iw as f32, ih as f32),
        ]
        .map(|p| self.transform.transform_point2(p));
        let Some((x0, y0, x1, y1)) = self.device_bounds(&corners, 0.0) else { return };

        let inverse = self.transform.inverse();
        for dy in y0..y1 {
            for dx in x0..x1 {
                // Sample at the device pixel centre.
                let src = inverse.transform_point2(Vec2::new(dx as f32 + 0.5, dy as f32 + 0.5));
                if src.x < 0.0 || src.y < 0.0 {
                    continue;
                }
                let (sx, sy) = (src.x as u32, src.y as u32);
                if sx >= iw || sy >= ih {
                    continue;
                }
                self.blend(dx, dy, *image.get_pixel(sx, sy));
            }
        }
    }

    fn set_color(&mut self, color: Rgba<u8>) {
        self.color = color;
    }

    fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width;
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2) {
        let a = self.transform.transform_point2(from);
        let b = self.transform.transform_point2(to);
        // Uniform-scale approximation of the user → device width.
        let scale = self.transform.matrix2.determinant().abs().sqrt();
        let half = (self.stroke_width * scale).max(Self::MIN_STROKE_PX) / 2.0;

        let Some((x0, y0, x1, y1)) = self.device_bounds(&[a, b], half) else { return };
        let color = self.color;
        for dy in y0..y1 {
            for dx in x0..x1 {
                let p = Vec2::new(dx as f32 + 0.5, dy as f32 + 0.5);
                if distance_to_segment(p, a, b) <= half {
                    self.blend(dx, dy, color);
                }
            }
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Porter-Duff source-over on straight (non-premultiplied) 8-bit RGBA.
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src.0[c] as f32 / 255.0;
        let d = dst.0[c] as f32 / 255.0;
        let v = (s * sa + d * da * (1.0 - sa)) / out_a;
        out[c] = (v * 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    Rgba(out)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn blend_opaque_source_replaces() {
        assert_eq!(blend_over(Rgba([1, 2, 3, 255]), RED), RED);
    }

    #[test]
    fn blend_transparent_source_keeps_destination() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(blend_over(dst, Rgba([255, 255, 255, 0])), dst);
    }

    #[test]
    fn blend_half_grey_over_black() {
        let out = blend_over(Rgba([0, 0, 0, 255]), Rgba([200, 200, 200, 128]));
        assert_eq!(out.0[3], 255);
        assert!((out.0[0] as i32 - 100).abs() <= 1, "got {:?}", out);
    }

    #[test]
    fn draw_image_at_identity_copies_pixels() {
        let src = RgbaImage::from_fn(2, 2, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        let mut c = RasterCanvas::new(RgbaImage::new(4, 4), Affine2::IDENTITY);
        c.draw_image(&src);
        assert_eq!(c.image().get_pixel(1, 1).0, [1, 1, 7, 255]);
        assert_eq!(c.image().get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn draw_image_scales_with_transform() {
        let src = RgbaImage::from_fn(2, 1, |x, _| Rgba([x as u8 * 100, 0, 0, 255]));
        let mut c = RasterCanvas::new(RgbaImage::new(8, 4), Affine2::from_scale(Vec2::splat(4.0)));
        c.draw_image(&src);
        assert_eq!(c.image().get_pixel(3, 3).0, [0, 0, 0, 255]);
        assert_eq!(c.image().get_pixel(4, 0).0, [100, 0, 0, 255]);
    }

    #[test]
    fn scale_then_restore_round_trips_transform() {
        let base = Affine2::from_scale(Vec2::splat(16.0));
        let mut c = RasterCanvas::new(RgbaImage::new(1, 1), base);
        let pushed = c.transform();
        c.scale(0.5, 0.5);
        assert_eq!(c.transform(), Affine2::from_scale(Vec2::splat(8.0)));
        c.set_transform(pushed);
        assert_eq!(c.transform(), base);
    }

    #[test]
    fn vertical_stroke_covers_its_column_only() {
        let mut c = RasterCanvas::new(RgbaImage::new(8, 8), Affine2::from_scale(Vec2::splat(4.0)));
        c.set_color(RED);
        c.set_stroke_width(0.25);
        c.stroke_line(Vec2::new(1.0, 0.0), Vec2::new(1.0, 2.0));
        // Device x = 4, width 1px → column 3/4 boundary; pixels centred within 0.5px.
        for y in 0..8 {
            assert_eq!(*c.image().get_pixel(3, y), RED);
            assert_eq!(*c.image().get_pixel(4, y), RED);
            assert_eq!(c.image().get_pixel(1, y).0[3], 0);
            assert_eq!(c.image().get_pixel(6, y).0[3], 0);
        }
    }

    #[test]
    fn stroke_outside_target_is_ignored() {
        let mut c = RasterCanvas::new(RgbaImage::new(4, 4), Affine2::IDENTITY);
        c.stroke_line(Vec2::new(-10.0, -10.0), Vec2::new(-5.0, -10.0));
        assert!(c.image().pixels().all(|p| p.0[3] == 0));
    }
}
