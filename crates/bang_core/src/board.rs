//! The board: heightfield, terrain and environment.
//!
//! A board is a `width × height` grid of tiles laid over a finer
//! heightfield of `(width·S + 1) × (height·S + 1)` vertices, where `S` is
//! [`HEIGHTFIELD_SUBDIVISIONS`]. Neighboring tiles share the vertices on
//! their common edge.
//!
//! Every query here is total: coordinates outside the board return a
//! defined sentinel instead of panicking. Mutators validate their
//! coordinates and return [`BoardError`] instead.

use crate::config::BoardConfig;
use crate::environment::{DirectionalLight, Environment};
use crate::error::{BoardError, Result};
use crate::geom::Rect;
use crate::occupancy::Occupancy;
use crate::terrain::Terrain;

/// Number of heightfield subdivisions along each edge of a tile.
pub const HEIGHTFIELD_SUBDIVISIONS: i32 = 4;

/// Elevation units per vertical tile size.
pub const ELEVATION_UNITS_PER_TILE: i32 = 64;

/// Largest difference between adjacent heightfield vertices before a tile
/// becomes rough.
pub const MAX_OCCUPIABLE_HEIGHT_DELTA: i32 = 16;

/// Deepest water (below the surface, in elevation units) that ground
/// units can still stand in.
pub const MAX_OCCUPIABLE_WATER_LEVEL: i8 = 1;

/// Keeps heightfield indices comfortably inside `i32`.
const MAX_BOARD_TILES: i32 = 4096;

/// Terrain, elevation and occupancy for one round.
#[derive(Debug, Clone)]
pub struct Board {
    width: i32,
    height: i32,
    hf_width: i32,
    hf_height: i32,
    /// Signed elevation per vertex.
    heightfield: Vec<i8>,
    /// Terrain per vertex.
    terrain: Vec<Terrain>,
    /// Height of the shadow volume above terrain per vertex.
    shadows: Vec<u8>,
    environment: Environment,
    playable: Rect,
    /// Returned for heightfield lookups beyond the edge.
    min_edge_height: i8,
    /// Most common terrain under each tile.
    predominant: Vec<Terrain>,
    pub(crate) occupancy: Occupancy,
}

impl Board {
    /// Create a flat, dry board of dirt.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidDimensions`] for non-positive sizes and
    /// [`BoardError::InvalidBorder`] when the border swallows the board.
    pub fn new(config: BoardConfig) -> Result<Self> {
        let BoardConfig {
            width,
            height,
            border,
        } = config;
        if width <= 0 || height <= 0 || width > MAX_BOARD_TILES || height > MAX_BOARD_TILES {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        if border < 0 || 2 * border >= width || 2 * border >= height {
            return Err(BoardError::InvalidBorder {
                border,
                width,
                height,
            });
        }

        let hf_width = width * HEIGHTFIELD_SUBDIVISIONS + 1;
        let hf_height = height * HEIGHTFIELD_SUBDIVISIONS + 1;
        let vertices = (hf_width as usize) * (hf_height as usize);
        let tiles = (width as usize) * (height as usize);

        Ok(Self {
            width,
            height,
            hf_width,
            hf_height,
            heightfield: vec![0; vertices],
            terrain: vec![Terrain::default(); vertices],
            shadows: vec![0; vertices],
            environment: Environment::default(),
            playable: Rect::new(border, border, width - 2 * border, height - 2 * border),
            min_edge_height: 0,
            predominant: vec![Terrain::default(); tiles],
            occupancy: Occupancy::new(tiles),
        })
    }

    /// Shorthand for a borderless board of the given size.
    ///
    /// # Errors
    ///
    /// See [`Board::new`].
    pub fn with_size(width: i32, height: i32) -> Result<Self> {
        Self::new(BoardConfig::new(width, height))
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Width of the heightfield in vertices.
    #[must_use]
    pub const fn heightfield_width(&self) -> i32 {
        self.hf_width
    }

    /// Height of the heightfield in vertices.
    #[must_use]
    pub const fn heightfield_height(&self) -> i32 {
        self.hf_height
    }

    /// The playable area. Tiles outside it are never occupiable.
    #[must_use]
    pub const fn playable_area(&self) -> &Rect {
        &self.playable
    }

    /// Whether the tile is on the board at all.
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Row-major index of an in-bounds tile.
    #[inline]
    pub(crate) fn tile_index(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[inline]
    fn vertex_in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.hf_width && y < self.hf_height
    }

    #[inline]
    fn vertex_index(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.hf_width as usize) + (x as usize)
    }

    /// Clamp tile coordinates to at most two tiles beyond the edge. Every
    /// vertex of a tile that far out is already off the heightfield, so the
    /// tile-level queries read the same values and the vertex math cannot
    /// overflow.
    #[inline]
    fn clamp_outside(&self, tx: i32, ty: i32) -> (i32, i32) {
        (tx.clamp(-2, self.width + 1), ty.clamp(-2, self.height + 1))
    }

    fn checked_vertex(&self, x: i32, y: i32) -> Result<usize> {
        if self.vertex_in_bounds(x, y) {
            Ok(self.vertex_index(x, y))
        } else {
            Err(BoardError::VertexOutOfRange { x, y })
        }
    }

    // ------------------------------------------------------------------
    // Heightfield
    // ------------------------------------------------------------------

    /// Height at the given sub-tile coordinates.
    ///
    /// Beyond the edge this is the board's minimum edge height, so the
    /// border never looks like a cliff.
    #[must_use]
    pub fn height_at(&self, x: i32, y: i32) -> i8 {
        if self.vertex_in_bounds(x, y) {
            self.heightfield[self.vertex_index(x, y)]
        } else {
            self.min_edge_height
        }
    }

    /// Set the height at the given sub-tile coordinates.
    ///
    /// Call [`Board::update_min_edge_height`] after editing edge vertices.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::VertexOutOfRange`] outside the heightfield.
    pub fn set_height(&mut self, x: i32, y: i32, value: i8) -> Result<()> {
        let idx = self.checked_vertex(x, y)?;
        self.heightfield[idx] = value;
        Ok(())
    }

    /// Raise or lower the height at the given sub-tile coordinates,
    /// clamping to the representable range.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::VertexOutOfRange`] outside the heightfield.
    pub fn add_height(&mut self, x: i32, y: i32, delta: i32) -> Result<()> {
        let idx = self.checked_vertex(x, y)?;
        let value = (i32::from(self.heightfield[idx]) + delta).clamp(-128, 127);
        self.heightfield[idx] = value as i8;
        Ok(())
    }

    /// Set every vertex to the same height.
    pub fn fill_heights(&mut self, value: i8) {
        self.heightfield.fill(value);
        self.min_edge_height = value;
    }

    /// The raw heightfield, row-major.
    #[must_use]
    pub fn heightfield(&self) -> &[i8] {
        &self.heightfield
    }

    /// The height returned for coordinates beyond the edge.
    #[must_use]
    pub const fn min_edge_height(&self) -> i8 {
        self.min_edge_height
    }

    /// Recompute the minimum height along the heightfield's outer edge.
    pub fn update_min_edge_height(&mut self) {
        let (w, h) = (self.hf_width, self.hf_height);
        let top = (0..w).map(|x| (x, 0));
        let bottom = (0..w).map(|x| (x, h - 1));
        let left = (0..h).map(|y| (0, y));
        let right = (0..h).map(|y| (w - 1, y));
        self.min_edge_height = top
            .chain(bottom)
            .chain(left)
            .chain(right)
            .map(|(x, y)| self.heightfield[self.vertex_index(x, y)])
            .min()
            .unwrap_or(0);
    }

    // ------------------------------------------------------------------
    // Terrain
    // ------------------------------------------------------------------

    /// Terrain at the given sub-tile coordinates. Coordinates beyond the
    /// edge repeat the edge vertex.
    #[must_use]
    pub fn terrain_at(&self, x: i32, y: i32) -> Terrain {
        let x = x.clamp(0, self.hf_width - 1);
        let y = y.clamp(0, self.hf_height - 1);
        self.terrain[self.vertex_index(x, y)]
    }

    /// Paint a single vertex.
    ///
    /// Call [`Board::update_predominant_terrain`] once painting is done.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::VertexOutOfRange`] outside the heightfield.
    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: Terrain) -> Result<()> {
        let idx = self.checked_vertex(x, y)?;
        self.terrain[idx] = terrain;
        Ok(())
    }

    /// Paint every vertex and refresh the predominant terrain.
    pub fn fill_terrain(&mut self, terrain: Terrain) {
        self.terrain.fill(terrain);
        self.predominant.fill(terrain);
    }

    /// The most common terrain under the tile. Coordinates beyond the edge
    /// repeat the edge tile.
    #[must_use]
    pub fn predominant_terrain(&self, x: i32, y: i32) -> Terrain {
        let x = x.clamp(0, self.width - 1);
        let y = y.clamp(0, self.height - 1);
        self.predominant[self.tile_index(x, y)]
    }

    /// Recompute the predominant terrain of every tile.
    pub fn update_predominant_terrain(&mut self) {
        let all = Rect::new(0, 0, self.width, self.height);
        self.update_predominant_terrain_in(&all);
    }

    /// Recompute the predominant terrain of the tiles in `area`.
    pub fn update_predominant_terrain_in(&mut self, area: &Rect) {
        for tile in area.tiles() {
            if self.in_bounds(tile.x, tile.y) {
                let idx = self.tile_index(tile.x, tile.y);
                self.predominant[idx] = self.compute_predominant_terrain(tile.x, tile.y);
            }
        }
    }

    /// Count terrain over every vertex of the tile, corners included.
    /// Ties go to the lowest terrain code.
    fn compute_predominant_terrain(&self, tx: i32, ty: i32) -> Terrain {
        let mut counts = [0u32; Terrain::ALL.len()];
        for (x, y) in self.tile_vertices(tx, ty) {
            counts[usize::from(self.terrain_at(x, y).code())] += 1;
        }
        let mut best = Terrain::default();
        let mut best_count = 0;
        for terrain in Terrain::ALL {
            let count = counts[usize::from(terrain.code())];
            if count > best_count {
                best = terrain;
                best_count = count;
            }
        }
        best
    }

    /// Every heightfield vertex under a tile, edges and corners included.
    fn tile_vertices(&self, tx: i32, ty: i32) -> impl Iterator<Item = (i32, i32)> {
        let (tx, ty) = self.clamp_outside(tx, ty);
        let x1 = tx * HEIGHTFIELD_SUBDIVISIONS;
        let y1 = ty * HEIGHTFIELD_SUBDIVISIONS;
        (y1..=y1 + HEIGHTFIELD_SUBDIVISIONS)
            .flat_map(move |y| (x1..=x1 + HEIGHTFIELD_SUBDIVISIONS).map(move |x| (x, y)))
    }

    // ------------------------------------------------------------------
    // Shadow volume
    // ------------------------------------------------------------------

    /// Height of the shadow volume above terrain. Zero beyond the edge.
    #[must_use]
    pub fn shadow_at(&self, x: i32, y: i32) -> u8 {
        if self.vertex_in_bounds(x, y) {
            self.shadows[self.vertex_index(x, y)]
        } else {
            0
        }
    }

    /// Set the shadow volume height at a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::VertexOutOfRange`] outside the heightfield.
    pub fn set_shadow(&mut self, x: i32, y: i32, value: u8) -> Result<()> {
        let idx = self.checked_vertex(x, y)?;
        self.shadows[idx] = value;
        Ok(())
    }

    /// Set every shadow volume height.
    pub fn fill_shadows(&mut self, value: u8) {
        self.shadows.fill(value);
    }

    // ------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------

    /// Water, light, sky and wind parameters.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Mutable access to the environment parameters.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// The water level in heightfield units.
    #[must_use]
    pub const fn water_level(&self) -> i8 {
        self.environment.water.level
    }

    /// Set the water level.
    ///
    /// Occupancy derived from water depth is only refreshed by the next
    /// [`Board::shadow_pieces`].
    pub fn set_water_level(&mut self, level: i8) {
        self.environment.water.level = level;
    }

    /// Replace one of the directional lights. The azimuth is normalized
    /// into `[0, 2π)`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidLight`] for an index beyond
    /// [`crate::environment::NUM_LIGHTS`].
    pub fn set_light(&mut self, index: usize, light: DirectionalLight) -> Result<()> {
        let slot = self
            .environment
            .lights
            .get_mut(index)
            .ok_or(BoardError::InvalidLight(index))?;
        *slot = DirectionalLight {
            azimuth: light.azimuth.normalized(),
            ..light
        };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Geometry queries
    // ------------------------------------------------------------------

    /// Terrain elevation at the tile center, in elevation units.
    #[must_use]
    pub fn heightfield_elevation(&self, x: i32, y: i32) -> i32 {
        let offset = HEIGHTFIELD_SUBDIVISIONS / 2;
        let (x, y) = self.clamp_outside(x, y);
        i32::from(self.height_at(
            x * HEIGHTFIELD_SUBDIVISIONS + offset,
            y * HEIGHTFIELD_SUBDIVISIONS + offset,
        ))
    }

    /// Elevation contributed by pieces stacked on the tile (props and
    /// track), in elevation units. Zero beyond the edge.
    #[must_use]
    pub fn piece_elevation(&self, x: i32, y: i32) -> i32 {
        if self.in_bounds(x, y) {
            i32::from(self.occupancy.estate[self.tile_index(x, y)]) * ELEVATION_UNITS_PER_TILE
        } else {
            0
        }
    }

    /// Combined terrain and piece elevation at the tile.
    #[must_use]
    pub fn elevation(&self, x: i32, y: i32) -> i32 {
        self.heightfield_elevation(x, y) + self.piece_elevation(x, y)
    }

    /// Whether any pair of adjacent vertices under the tile differs by more
    /// than [`MAX_OCCUPIABLE_HEIGHT_DELTA`].
    #[must_use]
    pub fn exceeds_max_height_delta(&self, tx: i32, ty: i32) -> bool {
        let (tx, ty) = self.clamp_outside(tx, ty);
        let x1 = tx * HEIGHTFIELD_SUBDIVISIONS;
        let y1 = ty * HEIGHTFIELD_SUBDIVISIONS;
        for y in y1..y1 + HEIGHTFIELD_SUBDIVISIONS {
            for x in x1..x1 + HEIGHTFIELD_SUBDIVISIONS {
                let base = i32::from(self.height_at(x, y));
                let neighbors = [
                    self.height_at(x, y + 1),
                    self.height_at(x + 1, y + 1),
                    self.height_at(x + 1, y),
                ];
                if neighbors
                    .iter()
                    .any(|&h| (i32::from(h) - base).abs() > MAX_OCCUPIABLE_HEIGHT_DELTA)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Whether any vertex of the tile lies more than `level` units below
    /// the water surface.
    #[must_use]
    pub fn is_under_water(&self, tx: i32, ty: i32, level: i8) -> bool {
        let surface = i32::from(self.water_level()) - i32::from(level);
        self.tile_vertices(tx, ty)
            .any(|(x, y)| i32::from(self.height_at(x, y)) < surface)
    }

    /// Whether any part of the tile is under any amount of water.
    #[must_use]
    pub fn is_under_any_water(&self, tx: i32, ty: i32) -> bool {
        self.is_under_water(tx, ty, 0)
    }

    /// Whether any part of the tile is too deep for ground units.
    #[must_use]
    pub fn is_under_deep_water(&self, tx: i32, ty: i32) -> bool {
        self.is_under_water(tx, ty, MAX_OCCUPIABLE_WATER_LEVEL)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}x{}]", self.width, self.height)
    }
}
