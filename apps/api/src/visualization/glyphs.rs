use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};

use super::Orientation;

pub const GLYPH_SIZE: u32 = 8;

/// Outline box drawn for characters the bitmap font does not cover.
const MISSING_GLYPH: [u8; 8] = [0x7E, 0x42, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];

/// A monochrome bitmap of a rendered word, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    bits: Vec<bool>,
}

impl Mask {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: u32, y: u32) {
        self.bits[(y * self.width + x) as usize] = true;
    }

    /// Iterates the coordinates of set pixels.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| (i as u32 % self.width, i as u32 / self.width))
    }

    /// Rotates 90° counter-clockwise: the end of the word points up.
    fn rotate_ccw(&self) -> Self {
        let mut rotated = Mask::blank(self.height, self.width);
        for (x, y) in self.pixels() {
            rotated.set(y, self.width - 1 - x);
        }
        rotated
    }
}

/// Width and height of `text` laid out horizontally at `scale`.
pub fn text_extent(text: &str, scale: u32) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    (chars * GLYPH_SIZE * scale, GLYPH_SIZE * scale)
}

/// Rasterizes `text` with the 8×8 bitmap font magnified by `scale`.
pub fn rasterize(text: &str, scale: u32, orientation: Orientation) -> Mask {
    let (width, height) = text_extent(text, scale);
    let mut mask = Mask::blank(width, height);

    for (index, c) in text.chars().enumerate() {
        let origin_x = index as u32 * GLYPH_SIZE * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x0 = origin_x + col * scale;
                let y0 = row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        mask.set(x0 + dx, y0 + dy);
                    }
                }
            }
        }
    }

    match orientation {
        Orientation::Horizontal => mask,
        Orientation::Vertical => mask.rotate_ccw(),
    }
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .unwrap_or(MISSING_GLYPH)
}
