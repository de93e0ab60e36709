use image::{Rgba, RgbaImage};

use crate::foundation::math::Rng64;

/// Cells per side of the glyph grid.
pub const GRID: usize = 5;

/// Number of independently drawn columns; the rest mirror them.
const DRAWN_COLUMNS: usize = GRID.div_ceil(2);

/// One glyph cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Background shows through.
    Empty,
    /// Filled with the primary color.
    Primary,
    /// Filled with the accent color.
    Accent,
}

/// Colors derived from the seed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Foreground hue in degrees.
    pub hue: f32,
    /// Straight-alpha primary color.
    pub primary: [u8; 4],
    /// Straight-alpha accent color.
    pub accent: [u8; 4],
    /// Straight-alpha background (transparent).
    pub background: [u8; 4],
}

/// Deterministic, horizontally mirror-symmetric glyph.
#[derive(Clone, Debug, PartialEq)]
pub struct IdenticonGlyph {
    cells: [[Cell; GRID]; GRID],
    palette: Palette,
}

impl IdenticonGlyph {
    /// Derive a glyph from `seed`. Identical seeds give identical glyphs.
    pub fn generate(seed: u64) -> Self {
        let mut rng = Rng64::new(seed);
        let hue = (rng.next_f64_01() * 360.0) as f32;

        let mut cells = [[Cell::Empty; GRID]; GRID];
        for row in cells.iter_mut() {
            for col in 0..DRAWN_COLUMNS {
                let filled = rng.chance(0.5);
                let accent = rng.chance(0.2);
                let cell = match (filled, accent) {
                    (false, _) => Cell::Empty,
                    (true, false) => Cell::Primary,
                    (true, true) => Cell::Accent,
                };
                row[col] = cell;
                row[GRID - 1 - col] = cell;
            }
        }

        let [r, g, b] = hsl_to_rgb(hue, 0.65, 0.55);
        let [ar, ag, ab] = hsl_to_rgb(hue + 30.0, 0.55, 0.35);
        let mut glyph = Self {
            cells,
            palette: Palette {
                hue,
                primary: [r, g, b, 255],
                accent: [ar, ag, ab, 255],
                background: [0, 0, 0, 0],
            },
        };
        if glyph.filled() == 0 {
            glyph.cells[GRID / 2][GRID / 2] = Cell::Primary;
        }
        glyph
    }

    /// Cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// The derived palette.
    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Number of filled cells.
    pub fn filled(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| **c != Cell::Empty)
            .count()
    }

    /// Return `true` when every row reads the same left-to-right and right-to-left.
    pub fn is_mirror_symmetric(&self) -> bool {
        self.cells
            .iter()
            .all(|row| (0..GRID).all(|c| row[c] == row[GRID - 1 - c]))
    }

    /// Rasterize at `side × side` pixels with integer cell sizes.
    ///
    /// The right half of the raster is a pixel mirror of the left half.
    pub fn rasterize(&self, side: u32) -> RgbaImage {
        let axis = CellAxis::new(side);
        let mut img = RgbaImage::new(side, side);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let color = match (axis.mirrored(x), axis.plain(y)) {
                (Some(col), Some(row)) => match self.cells[row][col] {
                    Cell::Empty => self.palette.background,
                    Cell::Primary => self.palette.primary,
                    Cell::Accent => self.palette.accent,
                },
                _ => self.palette.background,
            };
            *px = Rgba(color);
        }
        img
    }
}

/// Pixel → cell mapping along one axis.
#[derive(Clone, Copy, Debug)]
struct CellAxis {
    side: u32,
    cell: u32,
    margin: u32,
}

impl CellAxis {
    fn new(side: u32) -> Self {
        let cell = (side / GRID as u32).max(1);
        let margin = side.saturating_sub(cell * GRID as u32) / 2;
        Self { side, cell, margin }
    }

    fn plain(self, p: u32) -> Option<usize> {
        let p = p.checked_sub(self.margin)?;
        let idx = (p / self.cell) as usize;
        (idx < GRID).then_some(idx)
    }

    /// Left half maps directly; right half mirrors the left so leftover pixels stay symmetric.
    fn mirrored(self, p: u32) -> Option<usize> {
        let opposite = self.side - 1 - p;
        if p <= opposite {
            self.plain(p)
        } else {
            self.plain(opposite).map(|c| GRID - 1 - c)
        }
    }
}

/// HSL (degrees, `[0,1]`, `[0,1]`) to RGB8.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [r, g, b].map(|v| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
#[path = "../tests/unit/identicon.rs"]
mod tests;
