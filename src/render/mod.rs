//! Raster chart rendering.
//!
//! A small self-contained renderer: an RGBA [`Canvas`] with line, rectangle
//! and bitmap-glyph text primitives, a line+uncertainty-band chart built on
//! top of it, and a PNG encoder. No font assets; labels use the built-in
//! 5x7 glyph table.

pub mod chart;
pub mod font;
pub mod png;

pub use chart::SeriesChart;

use crate::errors::Result;

/// An RGBA color, straight alpha
pub type Color = [u8; 4];

/// A fixed-size RGBA pixel buffer with drawing primitives
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A canvas filled with the given background color
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&background);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Overwrite one pixel; out-of-bounds coordinates are ignored
    pub fn set_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Alpha-blend a color onto one pixel
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let a = alpha.clamp(0.0, 1.0);
        for c in 0..3 {
            let src = f32::from(color[c]);
            let dst = f32::from(self.pixels[idx + c]);
            self.pixels[idx + c] = (src * a + dst * (1.0 - a)).round() as u8;
        }
        self.pixels[idx + 3] = 255;
    }

    /// Bresenham line
    pub fn draw_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Solid axis-aligned rectangle
    pub fn fill_rect(&mut self, x: i64, y: i64, w: usize, h: usize, color: Color) {
        for yy in 0..h as i64 {
            for xx in 0..w as i64 {
                self.set_pixel(x + xx, y + yy, color);
            }
        }
    }

    /// Draw a string at (x, y) = top-left corner, using the 5x7 glyphs.
    /// Characters without a glyph advance the cursor but draw nothing.
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, color: Color) {
        let mut cursor = x;
        for c in text.chars() {
            if let Some(rows) = font::glyph(c) {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..font::GLYPH_WIDTH {
                        if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                            self.set_pixel(cursor + col as i64, y + row as i64, color);
                        }
                    }
                }
            }
            cursor += font::GLYPH_ADVANCE as i64;
        }
    }

    /// Encode the canvas as PNG bytes
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        png::encode_png(&self.pixels, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = [0, 0, 0, 255];
    const WHITE: Color = [255, 255, 255, 255];

    fn pixel(canvas: &Canvas, x: usize, y: usize) -> Color {
        let idx = (y * canvas.width + x) * 4;
        [
            canvas.pixels[idx],
            canvas.pixels[idx + 1],
            canvas.pixels[idx + 2],
            canvas.pixels[idx + 3],
        ]
    }

    #[test]
    fn line_endpoints_are_set() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.draw_line(1, 1, 8, 8, BLACK);
        assert_eq!(pixel(&canvas, 1, 1), BLACK);
        assert_eq!(pixel(&canvas, 8, 8), BLACK);
        assert_eq!(pixel(&canvas, 9, 1), WHITE);
    }

    #[test]
    fn out_of_bounds_draws_are_ignored() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        canvas.set_pixel(-1, 2, BLACK);
        canvas.set_pixel(2, 99, BLACK);
        canvas.draw_line(-5, -5, 8, 8, BLACK);
        assert_eq!(pixel(&canvas, 2, 2), BLACK);
    }

    #[test]
    fn blend_mixes_colors() {
        let mut canvas = Canvas::new(2, 2, WHITE);
        canvas.blend_pixel(0, 0, [0, 0, 0, 255], 0.5);
        let p = pixel(&canvas, 0, 0);
        assert!(p[0] > 100 && p[0] < 160);
    }

    #[test]
    fn text_marks_pixels() {
        let mut canvas = Canvas::new(30, 10, WHITE);
        canvas.draw_text(1, 1, "8", BLACK);
        let dark = (0..30)
            .flat_map(|x| (0..10).map(move |y| (x, y)))
            .filter(|&(x, y)| pixel(&canvas, x, y) == BLACK)
            .count();
        assert!(dark > 5);
    }
}
