//! Terrain classification and per-class traversal costs.

use serde::{Deserialize, Serialize};

/// The basic traversal cost of a tile, in tenths of a move point.
pub const BASE_TRAVERSAL: u16 = 10;

/// Terrain painted on heightfield vertices.
///
/// The discriminant is the terrain code stored per vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Terrain {
    /// Packed dirt, the default ground cover.
    #[default]
    Dirt = 0,
    /// Dirt with moss patches.
    Mossy = 1,
    /// Loose rock and scree.
    Rocky = 2,
    /// Wagon road.
    Road = 3,
    /// Tall prairie grass.
    TallGrass = 4,
    /// Loose sand.
    Sand = 5,
    /// Mud flats and river banks.
    Mud = 6,
    /// Snow cover.
    Snow = 7,
}

impl Terrain {
    /// Every terrain, in code order.
    pub const ALL: [Self; 8] = [
        Self::Dirt,
        Self::Mossy,
        Self::Rocky,
        Self::Road,
        Self::TallGrass,
        Self::Sand,
        Self::Mud,
        Self::Snow,
    ];

    /// The per-vertex code for this terrain.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a terrain by its code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Glyph used by the ASCII board renderer.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Dirt => '.',
            Self::Mossy => ',',
            Self::Rocky => '^',
            Self::Road => '=',
            Self::TallGrass => '"',
            Self::Sand => ':',
            Self::Mud => '~',
            Self::Snow => '*',
        }
    }
}

/// How a piece moves across the board.
///
/// Determines both which tiles a piece may enter (see
/// [`crate::board::Board::can_occupy`]) and how much each step costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementClass {
    /// Ordinary foot or hoof: flat tiles only.
    #[default]
    Ground,
    /// Steam-powered or otherwise sure-footed: flat and rough tiles.
    AllTerrain,
    /// Airborne: ignores occupancy entirely.
    Flyer,
}

impl MovementClass {
    /// Cost in tenths of a move point to enter a tile whose predominant
    /// terrain is `terrain`. Never below [`BASE_TRAVERSAL`].
    #[must_use]
    pub const fn traversal_cost(self, terrain: Terrain) -> u16 {
        match self {
            Self::Flyer => BASE_TRAVERSAL,
            Self::AllTerrain => match terrain {
                Terrain::Mud => BASE_TRAVERSAL + 5,
                _ => BASE_TRAVERSAL,
            },
            Self::Ground => match terrain {
                Terrain::Dirt | Terrain::Mossy | Terrain::Road => BASE_TRAVERSAL,
                Terrain::Sand | Terrain::TallGrass | Terrain::Snow => BASE_TRAVERSAL + 5,
                Terrain::Rocky | Terrain::Mud => BASE_TRAVERSAL * 2,
            },
        }
    }

    /// Whether this class may stand on rough tiles.
    #[must_use]
    pub const fn allows_rough(self) -> bool {
        matches!(self, Self::AllTerrain | Self::Flyer)
    }
}
