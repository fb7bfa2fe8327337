//! Garden rendering.
//!
//! The garden is a 40-cell grid that fills left to right as the level rises.
//! Filled cells draw from a palette that widens with the level. Empty cells
//! occasionally sprout a decorative seedling, which is the only random part;
//! the random source is passed in so callers and tests control it.

use crate::ledger::MAX_GARDEN_LEVEL;
use rand::Rng;

/// Number of cells in the garden grid
pub const GARDEN_CELLS: usize = 40;

/// Cells per row when the grid is drawn
pub const GARDEN_COLUMNS: usize = 10;

/// Chance an empty cell shows a decorative seedling (levels above 1 only)
pub const SEEDLING_CHANCE: f64 = 0.1;

const BARE_GLYPH: &str = "·";
const SEEDLING_GLYPH: &str = "🌱";

const PALETTE_LUSH: [&str; 5] = ["🌳", "🌸", "🌿", "🎋", "🌺"];
const PALETTE_WOODED: [&str; 4] = ["🌳", "🌸", "🌿", "🌱"];
const PALETTE_BLOOMING: [&str; 3] = ["🌸", "🌿", "🌱"];
const PALETTE_SPROUTING: [&str; 2] = ["🌱", "🌿"];
const PALETTE_SEEDED: [&str; 1] = ["🌱"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GardenCell {
    /// Unfilled ground
    Bare,
    /// Decorative sprout on unfilled ground; chosen at random
    Seedling,
    /// Grown cell
    Plant(&'static str),
}

impl GardenCell {
    pub fn glyph(&self) -> &'static str {
        match self {
            GardenCell::Bare => BARE_GLYPH,
            GardenCell::Seedling => SEEDLING_GLYPH,
            GardenCell::Plant(glyph) => glyph,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, GardenCell::Plant(_))
    }
}

/// Whether cell `index` is grown at `level`
///
/// Equivalent to `index / 40 < (level - 1) / 9`, kept in integers.
pub fn is_filled(index: usize, level: u8) -> bool {
    let level = usize::from(level.clamp(1, MAX_GARDEN_LEVEL));
    index * 9 < GARDEN_CELLS * (level - 1)
}

/// The palette used for grown cells at `level`
pub fn palette(level: u8) -> &'static [&'static str] {
    if level >= 9 {
        &PALETTE_LUSH
    } else if level >= 7 {
        &PALETTE_WOODED
    } else if level >= 5 {
        &PALETTE_BLOOMING
    } else if level >= 3 {
        &PALETTE_SPROUTING
    } else {
        &PALETTE_SEEDED
    }
}

/// Render the garden for a level in `1..=10`
pub fn render_garden<R: Rng + ?Sized>(level: u8, rng: &mut R) -> Vec<GardenCell> {
    let level = level.clamp(1, MAX_GARDEN_LEVEL);
    let palette = palette(level);

    (0..GARDEN_CELLS)
        .map(|i| {
            if is_filled(i, level) {
                GardenCell::Plant(palette[i % palette.len()])
            } else if level > 1 && rng.gen_bool(SEEDLING_CHANCE) {
                GardenCell::Seedling
            } else {
                GardenCell::Bare
            }
        })
        .collect()
}

/// Lay the cells out as text rows of [`GARDEN_COLUMNS`] glyphs
pub fn garden_rows(cells: &[GardenCell]) -> Vec<String> {
    cells
        .chunks(GARDEN_COLUMNS)
        .map(|row| {
            row.iter()
                .map(GardenCell::glyph)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
