/// Document-like map layouts.
///
/// A map is a grid of `width × height` character cells. Text "words" are
/// laid out line by line as `Block`s; coins sit on the first and last
/// character of every word so that hjkl practice means hopping between
/// word boundaries.
///
/// Generation is a pure function of (size, difficulty, seed). The
/// coordinator only depends on the `LayoutGenerator` trait, so a
/// different generator can be swapped in without touching game rules.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

/// A word on the map: row `y`, columns `[x, x + width)`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Block {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub text: String,
}

impl Block {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.y == y && x >= self.x && x < self.x + self.width
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MapLayout {
    pub width: usize,
    pub height: usize,
    pub blocks: Vec<Block>,
    pub coin_positions: Vec<Position>,
}

impl MapLayout {
    /// Character drawn at a cell: the block's letter, or a space.
    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.blocks
            .iter()
            .find(|b| b.contains(x, y))
            .and_then(|b| b.text.chars().nth(x - b.x))
            .unwrap_or(' ')
    }
}

/// Source of level layouts, keyed by difficulty (= level number).
pub trait LayoutGenerator {
    fn generate(&self, difficulty: u32, seed: u64) -> MapLayout;
}

// ══════════════════════════════════════════════════════════════
// Procedural generator
// ══════════════════════════════════════════════════════════════

const BLANK_LINE_CHANCE: f64 = 0.2;
const MIN_WORD: usize = 3;
const MAX_WORD: usize = 10;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Debug)]
pub struct MapGenerator {
    pub width: usize,
    pub height: usize,
}

impl MapGenerator {
    pub fn new(width: usize, height: usize) -> Self {
        MapGenerator {
            width: width.max(MAX_WORD + 2),
            height: height.max(1),
        }
    }
}

impl Default for MapGenerator {
    fn default() -> Self {
        MapGenerator::new(40, 20)
    }
}

impl LayoutGenerator for MapGenerator {
    fn generate(&self, difficulty: u32, seed: u64) -> MapLayout {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut blocks = vec![];
        let mut coin_positions = vec![];

        for y in 0..self.height {
            // Paragraph break (never on the first line)
            if y > 0 && rng.gen_bool(BLANK_LINE_CHANCE) {
                continue;
            }

            let words_on_line = 2 + rng.gen_range(0..4 + difficulty as usize);
            let mut x = 0;

            for _ in 0..words_on_line {
                let word_width = rng.gen_range(MIN_WORD..=MAX_WORD);
                if x + word_width >= self.width {
                    break;
                }

                let text: String = (0..word_width)
                    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                    .collect();

                coin_positions.push(Position::new(x, y));
                coin_positions.push(Position::new(x + word_width - 1, y));
                blocks.push(Block { x, y, width: word_width, text });

                x += word_width + 1 + rng.gen_range(0..2);
            }
        }

        MapLayout {
            width: self.width,
            height: self.height,
            blocks,
            coin_positions,
        }
    }
}
