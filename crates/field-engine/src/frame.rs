//! Colorized field image built from a sampled grid.

use field_common::{FieldResult, GeoBounds, Rgba};
use image::{imageops, RgbaImage};
use rayon::prelude::*;

use crate::colormap::ColorRamp;
use crate::config::EngineConfig;
use crate::sampler::RasterGrid;

/// How grid values become pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStyle {
    pub ramp: ColorRamp,
    pub domain_min: f64,
    pub domain_max: f64,
    /// Alpha written to every filled pixel.
    pub alpha: u8,
    /// Blur radius in display pixels; 0 draws the sharp frame only.
    pub blur: f32,
    /// Alpha of the sharp frame drawn over the blurred one.
    pub overlay_alpha: f32,
    /// Layer opacity on the display. Not baked into frames.
    pub opacity: f32,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl FieldStyle {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            ramp: ColorRamp::temperature(),
            domain_min: config.domain_min,
            domain_max: config.domain_max,
            alpha: config.fill_alpha_u8(),
            blur: config.blur_radius,
            overlay_alpha: config.overlay_alpha,
            opacity: config.layer_opacity,
        }
    }

    pub fn with_ramp(mut self, ramp: ColorRamp) -> Self {
        self.ramp = ramp;
        self
    }

    /// Blur sigma for a frame `frame_width` pixels wide shown `display_width`
    /// pixels wide.
    pub fn blur_sigma(&self, frame_width: usize, display_width: usize) -> f32 {
        if display_width == 0 || !(self.blur > 0.0) {
            return 0.0;
        }
        self.blur * frame_width as f32 / display_width as f32
    }

    /// Pixel color for a sampled value; `None` for cells without an estimate.
    pub fn color_for(&self, value: f32) -> Option<Rgba> {
        if value.is_nan() {
            return None;
        }
        let v = (value as f64).clamp(self.domain_min, self.domain_max);
        Some(
            self.ramp
                .color_for(v, self.domain_min, self.domain_max)
                .with_alpha(self.alpha),
        )
    }
}

/// RGBA image covering `bounds`, row-major with the northern row first.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFrame {
    pub width: usize,
    pub height: usize,
    pub bounds: GeoBounds,
    pub rgba: Vec<u8>,
}

impl FieldFrame {
    /// Fully transparent frame.
    pub fn transparent(width: usize, height: usize, bounds: GeoBounds) -> Self {
        Self {
            width,
            height,
            bounds,
            rgba: vec![0; width * height * 4],
        }
    }

    /// Block-fill a grid: every pixel of a cell's `step`×`step` block gets
    /// the cell color, clipped at the right and bottom edges.
    pub fn from_grid(grid: &RasterGrid, style: &FieldStyle) -> Self {
        let mut frame = Self::transparent(grid.width, grid.height, grid.bounds);
        if grid.is_empty() {
            return frame;
        }

        let colors: Vec<Option<Rgba>> = grid.values.par_iter().map(|&v| style.color_for(v)).collect();
        let step = grid.step;
        let cols = grid.cols;
        let width = grid.width;

        frame
            .rgba
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let cells = &colors[(y / step) * cols..(y / step + 1) * cols];
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    if let Some(c) = cells[x / step] {
                        px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
                    }
                }
            });

        frame
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some(Rgba::new(
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ))
    }

    /// Make a pixel fully transparent.
    pub fn clear_pixel(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * 4;
            self.rgba[i..i + 4].fill(0);
        }
    }

    /// Pixels with non-zero alpha.
    pub fn visible_pixel_count(&self) -> usize {
        self.rgba.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Gaussian-blur the frame by `sigma` pixels and draw the sharp frame
    /// back over it at `overlay_alpha`.
    ///
    /// Blurring runs on premultiplied colors so transparent neighbors do not
    /// darken the edges.
    pub fn soften(&self, sigma: f32, overlay_alpha: f32) -> FieldFrame {
        if self.is_empty() || !(sigma > 0.0) {
            return self.clone();
        }

        let premultiplied: Vec<u8> = self.rgba.chunks_exact(4).flat_map(premultiply).collect();
        let Some(image) = RgbaImage::from_raw(self.width as u32, self.height as u32, premultiplied)
        else {
            return self.clone();
        };
        let blurred = imageops::blur(&image, sigma);

        let mut out = Self::transparent(self.width, self.height, self.bounds);
        out.rgba
            .par_chunks_exact_mut(4)
            .zip(self.rgba.par_chunks_exact(4))
            .zip(blurred.as_raw().par_chunks_exact(4))
            .for_each(|((px, sharp), under)| {
                px.copy_from_slice(&source_over(sharp, overlay_alpha, under));
            });
        out
    }

    /// Copy with every alpha scaled by `opacity`.
    pub fn with_opacity(&self, opacity: f32) -> FieldFrame {
        let mut out = self.clone();
        let opacity = opacity.clamp(0.0, 1.0);
        for px in out.rgba.chunks_exact_mut(4) {
            px[3] = (px[3] as f32 * opacity).round() as u8;
        }
        out
    }

    pub fn to_png(&self) -> FieldResult<Vec<u8>> {
        crate::png::encode_rgba(&self.rgba, self.width, self.height)
    }
}

fn premultiply(px: &[u8]) -> [u8; 4] {
    let a = px[3] as u16;
    let scale = |c: u8| ((c as u16 * a + 127) / 255) as u8;
    [scale(px[0]), scale(px[1]), scale(px[2]), px[3]]
}

/// `sharp` (straight alpha, scaled by `alpha`) over `under` (premultiplied).
/// Returns straight alpha.
fn source_over(sharp: &[u8], alpha: f32, under: &[u8]) -> [u8; 4] {
    let sa = sharp[3] as f32 / 255.0 * alpha;
    let da = under[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0; 4];
    }

    let mut px = [0u8; 4];
    for c in 0..3 {
        let premul = sharp[c] as f32 / 255.0 * sa + under[c] as f32 / 255.0 * (1.0 - sa);
        px[c] = (premul / out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    px[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    px
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: Vec<f32>) -> RasterGrid {
        // 2x2 cells of 3 pixels on a 5x5 raster; last block column/row is clipped
        RasterGrid {
            bounds: GeoBounds::new(0.0, 0.0, 1.0, 1.0),
            width: 5,
            height: 5,
            step: 3,
            cols: 2,
            rows: 2,
            values,
        }
    }

    #[test]
    fn test_block_fill_and_transparency() {
        let style = FieldStyle::default();
        let frame = FieldFrame::from_grid(&grid(vec![-40.0, f32::NAN, 40.0, 0.0]), &style);

        let black = Rgba::new(0, 0, 0, 204);
        assert_eq!(frame.pixel(0, 0), Some(black));
        assert_eq!(frame.pixel(2, 2), Some(black));
        assert_eq!(frame.pixel(3, 0), Some(Rgba::transparent()));
        assert_eq!(frame.pixel(4, 2), Some(Rgba::transparent()));
        assert_eq!(frame.pixel(0, 4), Some(Rgba::new(0xc0, 0, 0, 204)));
        assert_eq!(frame.pixel(4, 4), Some(Rgba::new(0x00, 0xb0, 0x50, 204)));
        assert_eq!(frame.visible_pixel_count(), 25 - 6);
    }

    #[test]
    fn test_values_clamped_to_domain() {
        let style = FieldStyle::default();
        assert_eq!(style.color_for(-99.0), style.color_for(-40.0));
        assert_eq!(style.color_for(99.0), style.color_for(40.0));
        assert_eq!(style.color_for(f32::NAN), None);
    }

    fn block_frame() -> FieldFrame {
        // 40x40 with an opaque 20x20 block in the middle
        let mut frame = FieldFrame::transparent(40, 40, GeoBounds::new(0.0, 0.0, 1.0, 1.0));
        for y in 10..30 {
            for x in 10..30 {
                let i = (y * 40 + x) * 4;
                frame.rgba[i..i + 4].copy_from_slice(&[200, 40, 20, 204]);
            }
        }
        frame
    }

    #[test]
    fn test_soften_spreads_without_dark_fringe() {
        let frame = block_frame();
        let soft = frame.soften(3.0, 0.92);

        // inside: sharp copy over an equal blurred copy raises coverage
        let center = soft.pixel(20, 20).unwrap();
        assert!(center.a > 204);
        assert!((center.r as i32 - 200).abs() <= 2);
        assert!((center.g as i32 - 40).abs() <= 2);

        // just outside: only blurred color, same hue
        let halo = soft.pixel(8, 20).unwrap();
        assert!(halo.a > 0 && halo.a < 204);
        assert!((halo.r as i32 - 200).abs() <= 8);
        assert!((halo.g as i32 - 40).abs() <= 8);

        // beyond the kernel reach
        assert_eq!(soft.pixel(0, 0), Some(Rgba::transparent()));
    }

    #[test]
    fn test_soften_without_blur_is_identity() {
        let frame = block_frame();
        assert_eq!(frame.soften(0.0, 0.92), frame);
        let empty = FieldFrame::transparent(0, 0, frame.bounds);
        assert_eq!(empty.soften(5.0, 0.92), empty);
    }

    #[test]
    fn test_blur_sigma_follows_display_scale() {
        let style = FieldStyle::default();
        assert_eq!(style.blur, 14.0);
        assert!((style.blur_sigma(400, 800) - 7.0).abs() < 1e-6);
        assert_eq!(style.blur_sigma(400, 0), 0.0);

        let sharp = FieldStyle {
            blur: 0.0,
            ..FieldStyle::default()
        };
        assert_eq!(sharp.blur_sigma(400, 800), 0.0);
    }

    #[test]
    fn test_with_opacity_scales_alpha() {
        let frame = block_frame().with_opacity(0.5);
        assert_eq!(frame.pixel(20, 20), Some(Rgba::new(200, 40, 20, 102)));
        assert_eq!(frame.pixel(0, 0), Some(Rgba::transparent()));
    }
}
