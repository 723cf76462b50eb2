//! Frame buffers and drawing surfaces.
//!
//! [`Canvas`] is what callers draw on: direct pixel and region access, a few
//! software-rasterized primitives, BDF text, and an `embedded-graphics`
//! [`DrawTarget`] so the whole e-g primitive and text ecosystem works on it.
//! Drawing clips silently; only the addressed pixel operations report
//! out-of-range coordinates.

use core::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::OriginDimensions;
use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::RgbColor;
use embedded_graphics::Pixel;

use crate::error::Error;
use crate::font::Font;
use crate::Color;

/// Row-major grid of RGB pixels for one logical panel chain. Pure data, no
/// I/O; exclusively owned by whichever canvas currently holds it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FrameBuffer {
    width: usize,
    height: usize,
    data: Vec<Color>,
}

impl FrameBuffer {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Color::BLACK; width * height],
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub(crate) fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> Result<(), Error> {
        if !self.in_bounds(x, y) {
            return Err(Error::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.data[y as usize * self.width + x as usize] = color;
        Ok(())
    }

    /// Direct access by in-bounds coordinates.
    pub(crate) fn at(&self, x: usize, y: usize) -> Color {
        self.data[y * self.width + x]
    }

    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }

    /// Set a pixel, silently dropping anything outside the grid. Used by the
    /// shape and text rasterizers, which clip rather than fail.
    fn plot(&mut self, x: i32, y: i32, color: Color) {
        if self.in_bounds(x, y) {
            self.data[y as usize * self.width + x as usize] = color;
        }
    }

    /// Copy `colors` row-major into the `width`x`height` rectangle at
    /// (`x`, `y`), clipped to the grid. The buffer length is checked up
    /// front; on failure the grid is left unmodified.
    pub(crate) fn set_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        colors: &[Color],
    ) -> Result<(), Error> {
        let needed = width * height;
        if colors.len() < needed {
            return Err(Error::ShortBuffer {
                len: colors.len(),
                needed,
            });
        }
        for row in 0..height {
            for col in 0..width {
                self.plot(
                    x + col as i32,
                    y + row as i32,
                    colors[row * width + col],
                );
            }
        }
        Ok(())
    }

    pub(crate) fn fill(&mut self, color: Color) {
        self.data.fill(color);
    }

    pub(crate) fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    /// Integer Bresenham over all octants, no anti-aliasing.
    pub(crate) fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.plot(x, y, color);
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

    /// Midpoint circle. Octant mirrors are guarded so every pixel on the
    /// circle is touched exactly once.
    pub(crate) fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        if radius < 0 {
            return;
        }
        if radius == 0 {
            self.plot(cx, cy, color);
            return;
        }
        let mut x = radius;
        let mut y = 0;
        let mut d = 1 - radius;
        while x >= y {
            self.plot(cx + x, cy + y, color);
            self.plot(cx - x, cy + y, color);
            if y != 0 {
                self.plot(cx + x, cy - y, color);
                self.plot(cx - x, cy - y, color);
            }
            if x != y {
                self.plot(cx + y, cy + x, color);
                self.plot(cx + y, cy - x, color);
                if y != 0 {
                    self.plot(cx - y, cy + x, color);
                    self.plot(cx - y, cy - x, color);
                }
            }
            y += 1;
            if d < 0 {
                d += 2 * y + 1;
            } else {
                x -= 1;
                d += 2 * (y - x) + 1;
            }
        }
    }

    /// Blit `text` with `y` as the baseline. Returns the pixels advanced
    /// along the writing direction.
    pub(crate) fn draw_text(
        &mut self,
        font: &Font,
        x: i32,
        y: i32,
        color: Color,
        text: &str,
        spacing: i32,
        vertical: bool,
    ) -> i32 {
        let mut pen_x = x;
        let mut pen_y = y;
        for c in text.chars() {
            let Some(glyph) = font.glyph(c as u32) else {
                continue;
            };
            let top = pen_y - glyph.bbx_height - glyph.bbx_yoff;
            for (row, bits) in glyph.rows.iter().enumerate() {
                for col in 0..glyph.bbx_width {
                    if bits & (1 << (31 - col)) != 0 {
                        self.plot(pen_x + glyph.bbx_xoff + col, top + row as i32, color);
                    }
                }
            }
            if vertical {
                pen_y += font.height() + spacing;
            } else {
                pen_x += glyph.dwidth + spacing;
            }
        }
        if vertical {
            pen_y - y
        } else {
            pen_x - x
        }
    }

    fn draw_iter_clipping<I>(&mut self, pixels: I)
    where
        I: IntoIterator<Item = Pixel<Color>>,
    {
        for Pixel(p, c) in pixels {
            self.plot(p.x, p.y, c);
        }
    }
}

/// An offscreen drawing surface, exclusively owned by the caller until it is
/// handed to [`LedMatrix::swap_on_vsync`](crate::matrix::LedMatrix::swap_on_vsync).
#[derive(Clone, Debug)]
pub struct Canvas {
    frame: FrameBuffer,
}

impl Canvas {
    pub(crate) fn from_frame(frame: FrameBuffer) -> Self {
        Self { frame }
    }

    pub(crate) fn into_frame(self) -> FrameBuffer {
        self.frame
    }

    /// The width of the canvas in pixels.
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// The height of the canvas in pixels.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Set the color of a specific pixel.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> Result<(), Error> {
        self.frame.set_pixel(x, y, color)
    }

    /// Read back a pixel; `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.frame.pixel(x, y)
    }

    /// Copy the colors from `colors` into a rectangle on the canvas.
    pub fn set_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        colors: &[Color],
    ) -> Result<(), Error> {
        self.frame.set_pixels(x, y, width, height, colors)
    }

    /// Set the color of the entire canvas.
    pub fn fill(&mut self, color: Color) {
        self.frame.fill(color);
    }

    /// Clear the entire canvas to black.
    pub fn clear(&mut self) {
        self.frame.clear();
    }

    /// Draw a line of the specified color.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        self.frame.draw_line(x0, y0, x1, y1, color);
    }

    /// Draw a circle of the specified color.
    pub fn draw_circle(&mut self, x: i32, y: i32, radius: i32, color: Color) {
        self.frame.draw_circle(x, y, radius, color);
    }

    /// Draw `text` with `y` as the baseline; returns how many pixels were
    /// advanced on the canvas.
    pub fn draw_text(
        &mut self,
        font: &Font,
        x: i32,
        y: i32,
        color: Color,
        text: &str,
        spacing: i32,
        vertical: bool,
    ) -> i32 {
        self.frame.draw_text(font, x, y, color, text, spacing, vertical)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width() as u32, self.height() as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame.draw_iter_clipping(pixels);
        Ok(())
    }
}
