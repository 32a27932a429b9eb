//! Procedural board generation.
//!
//! Builds a heightfield and terrain layer from a seed:
//! - Rolling hills and lake basins
//! - Rough ridges that ground units must route around
//! - Patches of sand, grass, mud, rock and road
//! - Optional mirror or rotational symmetry for fair rounds
//!
//! Generation is fully deterministic: the same [`GeneratorConfig`] always
//! produces the same board.

use serde::{Deserialize, Serialize};

use crate::board::{Board, HEIGHTFIELD_SUBDIVISIONS};
use crate::config::BoardConfig;
use crate::error::Result;
use crate::rng::BoardRng;
use crate::terrain::Terrain;

/// Terrain painted by random patches.
const PATCH_TERRAIN: [Terrain; 6] = [
    Terrain::Sand,
    Terrain::TallGrass,
    Terrain::Mossy,
    Terrain::Rocky,
    Terrain::Mud,
    Terrain::Road,
];

/// Procedural generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Board dimensions.
    pub board: BoardConfig,
    /// Random seed for deterministic generation.
    pub seed: u64,
    /// Ground height the features are built on.
    pub base_height: i8,
    /// Number of hills.
    pub hills: u32,
    /// Number of lake basins. Zero leaves the board dry.
    pub lakes: u32,
    /// Water level used when lakes are present.
    pub water_level: i8,
    /// Number of rough ridges.
    pub ridges: u32,
    /// Number of terrain patches.
    pub patches: u32,
    /// Symmetry mode for fair rounds.
    pub symmetry: SymmetryMode,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            seed: 12345,
            base_height: 16,
            hills: 6,
            lakes: 2,
            water_level: 8,
            ridges: 2,
            patches: 10,
            symmetry: SymmetryMode::Rotational,
        }
    }
}

impl GeneratorConfig {
    /// A featureless config: a flat dirt board of the given size.
    #[must_use]
    pub fn flat(board: BoardConfig) -> Self {
        Self {
            board,
            hills: 0,
            lakes: 0,
            ridges: 0,
            patches: 0,
            symmetry: SymmetryMode::None,
            ..Self::default()
        }
    }

    /// Set the board dimensions.
    #[must_use]
    pub const fn with_board(mut self, board: BoardConfig) -> Self {
        self.board = board;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the symmetry mode.
    #[must_use]
    pub const fn with_symmetry(mut self, symmetry: SymmetryMode) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Load from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BoardError::ConfigParse`] for malformed input.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }
}

/// Symmetry mode for board generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SymmetryMode {
    /// No symmetry.
    None,
    /// Left half mirrored onto the right.
    Horizontal,
    /// Bottom half mirrored onto the top.
    Vertical,
    /// 180-degree rotational symmetry (standard for two sides).
    #[default]
    Rotational,
}

/// Generate a board with the given configuration.
///
/// The returned board has its minimum edge height and predominant terrain
/// up to date; occupancy is left for [`Board::shadow_pieces`].
///
/// # Errors
///
/// Returns an error if the board dimensions are invalid.
pub fn generate_board(config: &GeneratorConfig) -> Result<Board> {
    let mut board = Board::new(config.board)?;
    let mut rng = BoardRng::new(config.seed);

    board.fill_heights(config.base_height);

    for _ in 0..config.hills {
        let radius = rng.next_range(2, 5) * HEIGHTFIELD_SUBDIVISIONS;
        let peak = rng.next_range(10, 40);
        let (cx, cy) = random_vertex(&board, &mut rng);
        raise_mound(&mut board, cx, cy, radius, peak)?;
    }

    if config.lakes > 0 {
        board.set_water_level(config.water_level);
        for _ in 0..config.lakes {
            let radius = rng.next_range(2, 4) * HEIGHTFIELD_SUBDIVISIONS;
            let depth = i32::from(config.base_height) - i32::from(config.water_level)
                + rng.next_range(4, 12);
            let (cx, cy) = random_vertex(&board, &mut rng);
            raise_mound(&mut board, cx, cy, radius, -depth)?;
        }
    }

    for _ in 0..config.ridges {
        carve_ridge(&mut board, &mut rng)?;
    }

    for _ in 0..config.patches {
        paint_patch(&mut board, &mut rng)?;
    }

    apply_symmetry(&mut board, config.symmetry)?;

    board.update_min_edge_height();
    board.update_predominant_terrain();

    tracing::info!(
        board = %board,
        seed = config.seed,
        symmetry = ?config.symmetry,
        "Generated board"
    );
    Ok(board)
}

fn random_vertex(board: &Board, rng: &mut BoardRng) -> (i32, i32) {
    (
        rng.next_range(0, board.heightfield_width()),
        rng.next_range(0, board.heightfield_height()),
    )
}

/// Add a smooth mound (or basin, for negative `peak`) centered on a vertex.
fn raise_mound(board: &mut Board, cx: i32, cy: i32, radius: i32, peak: i32) -> Result<()> {
    let r2 = radius * radius;
    for y in (cy - radius).max(0)..=(cy + radius).min(board.heightfield_height() - 1) {
        for x in (cx - radius).max(0)..=(cx + radius).min(board.heightfield_width() - 1) {
            let d2 = (x - cx).pow(2) + (y - cy).pow(2);
            if d2 < r2 {
                board.add_height(x, y, peak * (r2 - d2) / r2)?;
            }
        }
    }
    Ok(())
}

/// A straight run of jagged rock, steep enough to make its tiles rough.
fn carve_ridge(board: &mut Board, rng: &mut BoardRng) -> Result<()> {
    let horizontal = rng.next_u64() % 2 == 0;
    let length = rng.next_range(3, 8) * HEIGHTFIELD_SUBDIVISIONS;
    let (sx, sy) = random_vertex(board, rng);
    for i in 0..length {
        let (x, y) = if horizontal { (sx + i, sy) } else { (sx, sy + i) };
        if x >= board.heightfield_width() || y >= board.heightfield_height() {
            break;
        }
        let spike = if i % 2 == 0 { 30 } else { 6 };
        board.add_height(x, y, spike)?;
        board.set_terrain(x, y, Terrain::Rocky)?;
    }
    Ok(())
}

fn paint_patch(board: &mut Board, rng: &mut BoardRng) -> Result<()> {
    let terrain = PATCH_TERRAIN[(rng.next_u64() % PATCH_TERRAIN.len() as u64) as usize];
    let width = rng.next_range(2, 6) * HEIGHTFIELD_SUBDIVISIONS;
    let height = rng.next_range(2, 6) * HEIGHTFIELD_SUBDIVISIONS;
    let (sx, sy) = random_vertex(board, rng);
    for y in sy..(sy + height).min(board.heightfield_height()) {
        for x in sx..(sx + width).min(board.heightfield_width()) {
            board.set_terrain(x, y, terrain)?;
        }
    }
    Ok(())
}

fn apply_symmetry(board: &mut Board, symmetry: SymmetryMode) -> Result<()> {
    let w = board.heightfield_width();
    let h = board.heightfield_height();
    let mirror: fn(i32, i32, i32, i32) -> (i32, i32) = match symmetry {
        SymmetryMode::None => return Ok(()),
        SymmetryMode::Horizontal => |x, y, w, _| (w - 1 - x, y),
        SymmetryMode::Vertical => |x, y, _, h| (x, h - 1 - y),
        SymmetryMode::Rotational => |x, y, w, h| (w - 1 - x, h - 1 - y),
    };

    for y in 0..h {
        for x in 0..w {
            let (mx, my) = mirror(x, y, w, h);
            // Copy each source vertex once, from the lower half.
            let source = match symmetry {
                SymmetryMode::Horizontal => x < mx,
                SymmetryMode::Vertical => y < my,
                _ => (y, x) < (my, mx),
            };
            if source {
                let height = board.height_at(x, y);
                let terrain = board.terrain_at(x, y);
                board.set_height(mx, my, height)?;
                board.set_terrain(mx, my, terrain)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GeneratorConfig {
        GeneratorConfig::default().with_board(BoardConfig::new(16, 12))
    }

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.board.width, 32);
        assert_eq!(config.symmetry, SymmetryMode::Rotational);
    }

    #[test]
    fn test_flat_config_builds_flat_board() {
        let board = generate_board(&GeneratorConfig::flat(BoardConfig::new(6, 6))).unwrap();
        assert!(board.heightfield().iter().all(|&h| h == 16));
        assert_eq!(board.predominant_terrain(3, 3), Terrain::Dirt);
        assert!(!board.is_under_any_water(3, 3));
    }

    #[test]
    fn test_determinism() {
        let a = generate_board(&small().with_seed(99)).unwrap();
        let b = generate_board(&small().with_seed(99)).unwrap();
        assert_eq!(a.heightfield(), b.heightfield());
        for y in 0..a.height() {
            for x in 0..a.width() {
                assert_eq!(a.predominant_terrain(x, y), b.predominant_terrain(x, y));
            }
        }
    }

    #[test]
    fn test_seeds_differ() {
        let a = generate_board(&small().with_seed(1)).unwrap();
        let b = generate_board(&small().with_seed(2)).unwrap();
        assert_ne!(a.heightfield(), b.heightfield());
    }

    #[test]
    fn test_rotational_symmetry() {
        let board = generate_board(&small().with_seed(7)).unwrap();
        let (w, h) = (board.heightfield_width(), board.heightfield_height());
        for y in 0..h {
            for x in 0..w {
                assert_eq!(board.height_at(x, y), board.height_at(w - 1 - x, h - 1 - y));
                assert_eq!(board.terrain_at(x, y), board.terrain_at(w - 1 - x, h - 1 - y));
            }
        }
    }

    #[test]
    fn test_horizontal_symmetry() {
        let config = small().with_seed(5).with_symmetry(SymmetryMode::Horizontal);
        let board = generate_board(&config).unwrap();
        let w = board.heightfield_width();
        for y in 0..board.heightfield_height() {
            for x in 0..w {
                assert_eq!(board.height_at(x, y), board.height_at(w - 1 - x, y));
            }
        }
    }

    #[test]
    fn test_lakes_set_water_level() {
        let config = GeneratorConfig {
            lakes: 3,
            ..small().with_seed(11)
        };
        let board = generate_board(&config).unwrap();
        assert_eq!(board.water_level(), config.water_level);

        let dry = GeneratorConfig {
            lakes: 0,
            ..small().with_seed(11)
        };
        assert_eq!(generate_board(&dry).unwrap().water_level(), crate::environment::NO_WATER);
    }

    #[test]
    fn test_from_ron() {
        let config = GeneratorConfig::from_ron_str(
            "(board: (width: 20, height: 20), seed: 3, symmetry: Vertical)",
        )
        .unwrap();
        assert_eq!(config.board.width, 20);
        assert_eq!(config.seed, 3);
        assert_eq!(config.symmetry, SymmetryMode::Vertical);
        assert_eq!(config.hills, GeneratorConfig::default().hills);
    }

    #[test]
    fn test_invalid_board_is_error() {
        let config = GeneratorConfig::flat(BoardConfig::new(0, 4));
        assert!(generate_board(&config).is_err());
    }
}
