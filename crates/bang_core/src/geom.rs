//! Tile coordinates, rectangles and tile sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Coordinates of a single board tile.
///
/// Signed so that neighbor arithmetic at the board edge never wraps;
/// every board query treats out-of-range tiles as a defined sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Tile {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four axis-aligned neighbors (east, west, north, south).
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x + 1, self.y),
            Self::new(self.x - 1, self.y),
            Self::new(self.x, self.y + 1),
            Self::new(self.x, self.y - 1),
        ]
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        crate::math::manhattan(self.x, self.y, other.x, other.y)
    }
}

impl From<(i32, i32)> for Tile {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned integer rectangle (origin plus size, in tiles).
///
/// Intersection follows strict overlap: rectangles that only share an
/// edge do not intersect, and empty rectangles intersect nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A 1x1 rectangle covering a single tile.
    #[must_use]
    pub const fn tile(tile: Tile) -> Self {
        Self::new(tile.x, tile.y, 1, 1)
    }

    /// Whether the rectangle covers no tiles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// One past the right-most column, saturating at `i32::MAX`.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom row, saturating at `i32::MAX`.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the tile lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Whether the two rectangles overlap by at least one tile.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The tiles covered by both rectangles. Empty if they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if !self.intersects(other) {
            return Self::default();
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Self::new(
            x,
            y,
            self.right().min(other.right()) - x,
            self.bottom().min(other.bottom()) - y,
        )
    }

    /// Iterate over every tile covered by the rectangle, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let (right, bottom) = if self.is_empty() {
            (self.x, self.y)
        } else {
            (self.right(), self.bottom())
        };
        (self.y..bottom).flat_map(move |y| (self.x..right).map(move |x| Tile::new(x, y)))
    }
}

/// An ordered set of tiles.
///
/// Iteration is always in (x, y) order so that consumers (AI, replays,
/// tests) see identical sequences on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSet {
    tiles: BTreeSet<Tile>,
}

impl TileSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile; returns `true` if it was not already present.
    pub fn insert(&mut self, tile: Tile) -> bool {
        self.tiles.insert(tile)
    }

    /// Remove a tile; returns `true` if it was present.
    pub fn remove(&mut self, tile: Tile) -> bool {
        self.tiles.remove(&tile)
    }

    /// Whether the set holds the tile at `(x, y)`.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.tiles.contains(&Tile::new(x, y))
    }

    /// Whether the set holds the tile.
    #[must_use]
    pub fn contains_tile(&self, tile: Tile) -> bool {
        self.tiles.contains(&tile)
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Remove every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Iterate in (x, y) order.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles.iter().copied()
    }

    /// Keep only the tiles matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(Tile) -> bool) {
        self.tiles.retain(|tile| keep(*tile));
    }

    /// Adds the square frame of tiles at Chebyshev distance `dist` around
    /// `center`, skipping tiles outside `bounds`.
    pub fn add_frame(&mut self, center: Tile, dist: i32, bounds: &Rect) {
        if bounds.is_empty() {
            return;
        }
        let dist = i64::from(dist.max(0));
        let (cx, cy) = (i64::from(center.x), i64::from(center.y));
        let (left, top) = (i64::from(bounds.x), i64::from(bounds.y));
        let (right, bottom) = (i64::from(bounds.right()) - 1, i64::from(bounds.bottom()) - 1);

        // Only tiles inside `bounds` are visited, so they always fit in i32.
        let mut add = |x: i64, y: i64| {
            if (left..=right).contains(&x) && (top..=bottom).contains(&y) {
                self.insert(Tile::new(x as i32, y as i32));
            }
        };
        for x in (cx - dist).max(left)..=(cx + dist).min(right) {
            add(x, cy - dist);
            add(x, cy + dist);
        }
        for y in (cy - dist + 1).max(top)..=(cy + dist - 1).min(bottom) {
            add(cx - dist, y);
            add(cx + dist, y);
        }
    }
}

impl FromIterator<Tile> for TileSet {
    fn from_iter<I: IntoIterator<Item = Tile>>(iter: I) -> Self {
        Self {
            tiles: iter.into_iter().collect(),
        }
    }
}

impl Extend<Tile> for TileSet {
    fn extend<I: IntoIterator<Item = Tile>>(&mut self, iter: I) {
        self.tiles.extend(iter);
    }
}
