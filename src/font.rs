//! BDF bitmap font loading.
//!
//! Only the handful of BDF fields needed for glyph blitting are parsed:
//! the font bounding box, per-glyph encodings, device widths, black-box
//! geometry and bitmap rows. Fonts are immutable after load.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Clone)]
pub(crate) struct Glyph {
    /// Horizontal pen advance.
    pub dwidth: i32,
    pub bbx_width: i32,
    pub bbx_height: i32,
    pub bbx_xoff: i32,
    pub bbx_yoff: i32,
    /// One word per bitmap row, leftmost pixel in bit 31.
    pub rows: Vec<u32>,
}

/// A parsed BDF font: a glyph table keyed by character code.
#[derive(Debug, Clone)]
pub struct Font {
    height: i32,
    baseline: i32,
    glyphs: HashMap<u32, Glyph>,
}

impl Font {
    /// Load a BDF font from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub(crate) fn parse(text: &str) -> Result<Self, Error> {
        let mut height = None;
        let mut baseline = 0;
        let mut glyphs = HashMap::new();

        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("FONTBOUNDINGBOX") => {
                    let (_w, h, _xoff, yoff) = parse4(line)?;
                    height = Some(h);
                    baseline = h + yoff;
                }
                Some("STARTCHAR") => {
                    let (code, glyph) = parse_glyph(&mut lines)?;
                    glyphs.insert(code, glyph);
                }
                _ => {}
            }
        }

        let height = height
            .ok_or_else(|| Error::Font("missing FONTBOUNDINGBOX".into()))?;
        if glyphs.is_empty() {
            return Err(Error::Font("no glyphs".into()));
        }
        Ok(Self {
            height,
            baseline,
            glyphs,
        })
    }

    /// Nominal glyph height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Distance from the top of a line to the baseline.
    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    pub(crate) fn glyph(&self, code: u32) -> Option<&Glyph> {
        self.glyphs.get(&code)
    }
}

fn parse_int(field: Option<&str>, line: &str) -> Result<i32, Error> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::Font(format!("bad line {line:?}")))
}

fn parse4(line: &str) -> Result<(i32, i32, i32, i32), Error> {
    let mut fields = line.split_whitespace().skip(1);
    Ok((
        parse_int(fields.next(), line)?,
        parse_int(fields.next(), line)?,
        parse_int(fields.next(), line)?,
        parse_int(fields.next(), line)?,
    ))
}

fn parse_glyph<'a, I: Iterator<Item = &'a str>>(lines: &mut I) -> Result<(u32, Glyph), Error> {
    let mut code = None;
    let mut dwidth = 0;
    let mut bbx = (0, 0, 0, 0);
    let mut rows = Vec::new();

    for line in lines.by_ref() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("ENCODING") => {
                let value = parse_int(fields.next(), line)?;
                if value >= 0 {
                    code = Some(value as u32);
                }
            }
            Some("DWIDTH") => dwidth = parse_int(fields.next(), line)?,
            Some("BBX") => bbx = parse4(line)?,
            Some("BITMAP") => break,
            Some("ENDCHAR") => {
                return Err(Error::Font("glyph without BITMAP".into()));
            }
            _ => {}
        }
    }

    for line in lines.by_ref() {
        let line = line.trim();
        if line == "ENDCHAR" {
            break;
        }
        if line.len() > 8 {
            return Err(Error::Font("glyphs wider than 32 pixels unsupported".into()));
        }
        let bits = u32::from_str_radix(line, 16)
            .map_err(|_| Error::Font(format!("bad bitmap row {line:?}")))?;
        // BDF rows are padded to whole bytes, MSB first; left-align to 32.
        let row_bits = (line.len() * 4) as u32;
        rows.push(bits << (32 - row_bits));
    }

    let code = code.ok_or_else(|| Error::Font("glyph without ENCODING".into()))?;
    let (bbx_width, bbx_height, bbx_xoff, bbx_yoff) = bbx;
    if bbx_width > 32 {
        return Err(Error::Font(format!(
            "glyph {code} is {bbx_width} pixels wide, at most 32 supported"
        )));
    }
    if rows.len() != bbx_height as usize {
        return Err(Error::Font(format!(
            "glyph {code} has {} bitmap rows, BBX says {bbx_height}",
            rows.len()
        )));
    }
    Ok((
        code,
        Glyph {
            dwidth,
            bbx_width,
            bbx_height,
            bbx_xoff,
            bbx_yoff,
            rows,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::FrameBuffer;
    use crate::Color;
    use embedded_graphics::pixelcolor::RgbColor;

    const TINY: &str = "\
STARTFONT 2.1
FONT tiny4x6
SIZE 6 75 75
FONTBOUNDINGBOX 4 6 0 -1
CHARS 2
STARTCHAR exclam
ENCODING 33
DWIDTH 2 0
BBX 1 5 0 0
BITMAP
80
80
80
00
80
ENDCHAR
STARTCHAR block
ENCODING 35
DWIDTH 4 0
BBX 3 3 0 0
BITMAP
E0
E0
E0
ENDCHAR
ENDFONT
";

    #[test]
    fn parses_metrics_and_glyphs() {
        let font = Font::parse(TINY).unwrap();
        assert_eq!(font.height(), 6);
        assert_eq!(font.baseline(), 5);
        let glyph = font.glyph('!' as u32).unwrap();
        assert_eq!(glyph.dwidth, 2);
        assert_eq!(glyph.rows.len(), 5);
        assert!(font.glyph('?' as u32).is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Font::parse("not a font").is_err());
        assert!(Font::parse("FONTBOUNDINGBOX 4 6 0 -1\n").is_err());
    }

    #[test]
    fn rejects_glyphs_declared_wider_than_32() {
        // a BBX width beyond the row word would shift out of range when blitted
        let wide = "\
FONTBOUNDINGBOX 34 6 0 -1
STARTCHAR wide
ENCODING 64
DWIDTH 34 0
BBX 33 1 0 0
BITMAP
80
ENDCHAR
";
        assert!(Font::parse(wide).is_err());
    }

    #[test]
    fn draw_text_advances_and_blits() {
        let font = Font::parse(TINY).unwrap();
        let white = Color::new(255, 255, 255);
        let mut frame = FrameBuffer::new(16, 8);
        // baseline at y=6
        let advanced = frame.draw_text(&font, 0, 6, white, "!#", 1, false);
        // '!' advances 2+1, '#' advances 4+1
        assert_eq!(advanced, 8);
        // '!' column: five rows ending at the baseline, with a gap
        assert_eq!(frame.pixel(0, 1), Some(white));
        assert_eq!(frame.pixel(0, 4), Some(Color::BLACK));
        assert_eq!(frame.pixel(0, 5), Some(white));
        // '#' block starts at the pen position of the second glyph
        assert_eq!(frame.pixel(3, 3), Some(white));
        assert_eq!(frame.pixel(3, 5), Some(white));
    }

    #[test]
    fn draw_text_vertical_advances_by_line() {
        let font = Font::parse(TINY).unwrap();
        let white = Color::new(255, 255, 255);
        let mut frame = FrameBuffer::new(8, 20);
        let advanced = frame.draw_text(&font, 0, 6, white, "!!", 0, true);
        assert_eq!(advanced, 12);
        assert_eq!(frame.pixel(0, 5), Some(white));
        assert_eq!(frame.pixel(0, 11), Some(white));
    }

    #[test]
    fn unknown_glyphs_are_skipped() {
        let font = Font::parse(TINY).unwrap();
        let mut frame = FrameBuffer::new(8, 8);
        let advanced = frame.draw_text(&font, 0, 6, Color::new(255, 0, 0), "?!", 0, false);
        assert_eq!(advanced, 2);
    }
}
