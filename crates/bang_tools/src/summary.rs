//! Board statistics for generator previews.

use std::collections::BTreeMap;

use bang_core::board::Board;
use bang_core::occupancy::TileState;
use bang_core::terrain::Terrain;
use serde::Serialize;

/// Counts describing a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
    /// Playable tiles.
    pub playable: usize,
    /// Water level in heightfield units.
    pub water_level: i8,
    /// Tiles per predominant terrain, by name.
    pub terrain: BTreeMap<String, usize>,
    /// Playable tiles ground units can stand on.
    pub occupiable: usize,
    /// Playable tiles too steep for ground units.
    pub rough: usize,
    /// Playable tiles under deep water.
    pub impassable: usize,
}

impl BoardSummary {
    /// Summarize a board with occupancy already shadowed.
    #[must_use]
    pub fn of(board: &Board) -> Self {
        let mut terrain: BTreeMap<String, usize> = BTreeMap::new();
        let (mut occupiable, mut rough, mut impassable) = (0, 0, 0);
        let playable = *board.playable_area();

        for tile in playable.tiles() {
            let kind: Terrain = board.predominant_terrain(tile.x, tile.y);
            *terrain.entry(format!("{kind:?}")).or_default() += 1;
            match board.base_tile_state(tile.x, tile.y) {
                Some(TileState::Flat) => occupiable += 1,
                Some(TileState::Rough) => rough += 1,
                Some(TileState::Impassable) => impassable += 1,
                _ => {}
            }
        }

        Self {
            width: board.width(),
            height: board.height(),
            playable: playable.tiles().count(),
            water_level: board.water_level(),
            terrain,
            occupiable,
            rough,
            impassable,
        }
    }
}

impl std::fmt::Display for BoardSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}x{} board, {} playable tiles, water level {}",
            self.width, self.height, self.playable, self.water_level
        )?;
        writeln!(
            f,
            "  occupiable {}  rough {}  impassable {}",
            self.occupiable, self.rough, self.impassable
        )?;
        for (name, count) in &self.terrain {
            writeln!(f, "  {name:<10} {count}")?;
        }
        Ok(())
    }
}
