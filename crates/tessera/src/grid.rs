use serde::{Deserialize, Serialize};

use crate::components::{Rotation, Variant, MAX_GRID_CELLS};
use crate::rng::Rng;

/// Which container issued a tile identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileScope {
    Field,
    Grid,
}

/// Opaque tile identity. Field and grid identities never collide, so a tile
/// copied into the grid is always distinguishable from its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub scope: TileScope,
    pub serial: u64,
}

impl TileId {
    pub fn field(serial: u64) -> Self {
        TileId { scope: TileScope::Field, serial }
    }

    pub fn grid(serial: u64) -> Self {
        TileId { scope: TileScope::Grid, serial }
    }
}

/// The transferable content of a tile: what it shows and how it is turned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileFace {
    pub variant: Variant,
    pub rotation: Rotation,
}

impl TileFace {
    pub fn new(variant: Variant, rotation: Rotation) -> Self {
        TileFace { variant, rotation }
    }

    /// Uniform over every variant and rotation.
    pub fn random(rng: &mut Rng) -> Self {
        TileFace {
            variant: rng.variant(),
            rotation: rng.rotation(),
        }
    }
}

/// A single decorative tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub variant: Variant,
    pub rotation: Rotation,
}

impl Tile {
    pub fn new(id: TileId, face: TileFace) -> Self {
        Tile {
            id,
            variant: face.variant,
            rotation: face.rotation,
        }
    }

    pub fn face(&self) -> TileFace {
        TileFace::new(self.variant, self.rotation)
    }

    /// Rotate the tile clockwise by 90 degrees.
    pub fn rotate(&mut self) {
        self.rotation = self.rotation.rotated();
    }
}

/// Placed-tile tally per variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCounts(pub [u32; Variant::COUNT]);

impl VariantCounts {
    pub fn get(&self, variant: Variant) -> u32 {
        self.0[variant.index()]
    }

    pub fn add(&mut self, variant: Variant) {
        self.0[variant.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

/// Cell count for a `width x height` grid, or `None` if either side is zero
/// or the product exceeds `MAX_GRID_CELLS`.
pub fn checked_cell_count(width: usize, height: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return None;
    }
    width.checked_mul(height).filter(|&n| n <= MAX_GRID_CELLS)
}

/// Parse operator-entered grid dimensions. Both must be positive base-10 integers
/// and the grid must fit within `MAX_GRID_CELLS`.
pub fn parse_dimensions(horizontal: &str, vertical: &str) -> Option<(usize, usize)> {
    let width = horizontal.trim().parse::<usize>().ok()?;
    let height = vertical.trim().parse::<usize>().ok()?;
    checked_cell_count(width, height)?;
    Some((width, height))
}

/// The customer's composition. Row-major: `cells[row * width + col]`.
/// `None` means an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<Tile>>,
    next_serial: u64,
}

impl CompositionGrid {
    /// An all-empty grid. `None` when either dimension is zero or the grid is too large.
    pub fn new(width: usize, height: usize) -> Option<Self> {
        let count = checked_cell_count(width, height)?;
        Some(CompositionGrid {
            width,
            height,
            cells: vec![None; count],
            next_serial: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Bounds check on signed coordinates, so drops left of or above the grid are rejected.
    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as u64) < self.height as u64 && (col as u64) < self.width as u64
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Tile> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.cells[self.idx(row, col)].as_ref()
    }

    fn next_id(&mut self) -> TileId {
        let id = TileId::grid(self.next_serial);
        self.next_serial += 1;
        id
    }

    /// Rebuild at the new size, keeping the overlapping top-left block.
    /// Returns false (and changes nothing) if either dimension is zero or the grid is too large.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        let Some(count) = checked_cell_count(width, height) else {
            return false;
        };
        let mut cells = vec![None; count];
        for row in 0..height.min(self.height) {
            for col in 0..width.min(self.width) {
                cells[row * width + col] = self.cells[self.idx(row, col)];
            }
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
        true
    }

    /// Put a copy of `face` at (row, col) under a fresh grid identity,
    /// replacing whatever was there. Out-of-bounds placements are dropped.
    pub fn place_tile(&mut self, row: i64, col: i64, face: TileFace) -> Option<TileId> {
        if !self.in_bounds(row, col) {
            return None;
        }
        let id = self.next_id();
        let i = self.idx(row as usize, col as usize);
        self.cells[i] = Some(Tile::new(id, face));
        Some(id)
    }

    /// Place into the first empty cell in row-major order.
    /// Returns the (row, col) used, or `None` if the grid is full.
    pub fn place_first_empty(&mut self, face: TileFace) -> Option<(usize, usize)> {
        let i = self.cells.iter().position(|c| c.is_none())?;
        let id = self.next_id();
        self.cells[i] = Some(Tile::new(id, face));
        Some((i / self.width, i % self.width))
    }

    /// Empty the cell, returning what was there.
    pub fn remove_tile(&mut self, row: usize, col: usize) -> Option<Tile> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let i = self.idx(row, col);
        self.cells[i].take()
    }

    /// Advance the tile at (row, col) by 90 degrees. False if the cell is empty.
    pub fn rotate_tile(&mut self, row: usize, col: usize) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        let i = self.idx(row, col);
        match self.cells[i].as_mut() {
            Some(tile) => {
                tile.rotate();
                true
            }
            None => false,
        }
    }

    /// Empty every cell; dimensions are kept.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Fill every cell with a freshly drawn random tile.
    pub fn fill_random(&mut self, rng: &mut Rng) {
        for i in 0..self.cells.len() {
            let id = self.next_id();
            self.cells[i] = Some(Tile::new(id, TileFace::random(rng)));
        }
    }

    pub fn has_empty_cell(&self) -> bool {
        self.cells.iter().any(|c| c.is_none())
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len() - self.empty_count()
    }

    pub fn variant_counts(&self) -> VariantCounts {
        let mut counts = VariantCounts::default();
        for tile in self.cells.iter().flatten() {
            counts.add(tile.variant);
        }
        counts
    }

    /// Occupied cells as (row, col, tile), row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &Tile)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.as_ref().map(|t| (i / self.width, i % self.width, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(v: Variant, r: Rotation) -> TileFace {
        TileFace::new(v, r)
    }

    #[test]
    fn tile_rotate_cycles() {
        let mut tile = Tile::new(TileId::grid(0), face(Variant::S1, Rotation::Deg180));
        tile.rotate();
        assert_eq!(tile.rotation, Rotation::Deg270);
        tile.rotate();
        assert_eq!(tile.rotation, Rotation::Deg0);
        assert_eq!(tile.variant, Variant::S1);
    }

    #[test]
    fn dimensions_must_be_positive_integers() {
        assert_eq!(parse_dimensions("4", " 3 "), Some((4, 3)));
        assert_eq!(parse_dimensions("0", "3"), None);
        assert_eq!(parse_dimensions("-2", "3"), None);
        assert_eq!(parse_dimensions("abc", "3"), None);
        assert_eq!(parse_dimensions("4", ""), None);
        assert!(CompositionGrid::new(0, 5).is_none());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        assert_eq!(parse_dimensions("4294967296", "4294967296"), None);
        assert_eq!(parse_dimensions("100000", "100000"), None);
        assert_eq!(parse_dimensions("100", "100"), Some((100, 100)));
        assert_eq!(parse_dimensions("101", "100"), None);
        assert!(CompositionGrid::new(usize::MAX, 2).is_none());
        assert!(CompositionGrid::new(MAX_GRID_CELLS + 1, 1).is_none());

        let mut grid = CompositionGrid::new(2, 2).unwrap();
        grid.place_tile(0, 0, face(Variant::S0, Rotation::Deg0));
        let before = grid.clone();
        assert!(!grid.resize(usize::MAX, usize::MAX));
        assert!(!grid.resize(65_536, 65_536));
        assert_eq!(grid, before);
    }

    #[test]
    fn place_keeps_face_and_issues_grid_identity() {
        let mut grid = CompositionGrid::new(3, 2).unwrap();
        let f = face(Variant::S2, Rotation::Deg90);
        let id = grid.place_tile(1, 2, f).unwrap();
        assert_eq!(id.scope, TileScope::Grid);
        let t = grid.get(1, 2).unwrap();
        assert_eq!(t.face(), f);
        assert_eq!(t.id, id);

        let again = grid.place_tile(1, 2, f).unwrap();
        assert_ne!(id, again, "every placement gets a fresh identity");
    }

    #[test]
    fn out_of_bounds_place_is_dropped() {
        let mut grid = CompositionGrid::new(2, 2).unwrap();
        let f = face(Variant::S0, Rotation::Deg0);
        assert!(grid.place_tile(2, 0, f).is_none());
        assert!(grid.place_tile(0, -1, f).is_none());
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn first_empty_is_row_major() {
        let mut grid = CompositionGrid::new(2, 2).unwrap();
        let f = face(Variant::S0, Rotation::Deg0);
        grid.place_tile(0, 0, f);
        assert_eq!(grid.place_first_empty(f), Some((0, 1)));
        assert_eq!(grid.place_first_empty(f), Some((1, 0)));
        assert_eq!(grid.place_first_empty(f), Some((1, 1)));
        assert_eq!(grid.place_first_empty(f), None);
        assert!(!grid.has_empty_cell());
    }

    #[test]
    fn remove_and_rotate_are_noops_on_empty() {
        let mut grid = CompositionGrid::new(2, 1).unwrap();
        assert!(grid.remove_tile(0, 0).is_none());
        assert!(!grid.rotate_tile(0, 1));
        assert!(grid.remove_tile(5, 5).is_none());

        grid.place_tile(0, 1, face(Variant::S1, Rotation::Deg270));
        assert!(grid.rotate_tile(0, 1));
        assert_eq!(grid.get(0, 1).unwrap().rotation, Rotation::Deg0);
        assert!(grid.remove_tile(0, 1).is_some());
        assert!(grid.get(0, 1).is_none());
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut grid = CompositionGrid::new(3, 3).unwrap();
        for row in 0..3 {
            for col in 0..3 {
                grid.place_tile(row, col, face(Variant::from_index(((row + col) % 3) as usize).unwrap(), Rotation::Deg0));
            }
        }
        let before = grid.clone();
        assert!(grid.resize(2, 4));
        assert_eq!((grid.width(), grid.height()), (2, 4));
        for row in 0..3 {
            for col in 0..2 {
                assert_eq!(grid.get(row, col), before.get(row, col));
            }
        }
        assert!(grid.get(3, 0).is_none());
        assert!(grid.get(3, 1).is_none());
    }

    #[test]
    fn resize_to_zero_is_rejected() {
        let mut grid = CompositionGrid::new(2, 2).unwrap();
        grid.place_tile(0, 0, face(Variant::S0, Rotation::Deg0));
        let before = grid.clone();
        assert!(!grid.resize(0, 4));
        assert_eq!(grid, before);
    }

    #[test]
    fn clear_keeps_dimensions() {
        let mut grid = CompositionGrid::new(4, 2).unwrap();
        grid.fill_random(&mut Rng::new(3));
        assert!(!grid.has_empty_cell());
        grid.clear();
        assert_eq!((grid.width(), grid.height()), (4, 2));
        assert_eq!(grid.empty_count(), 8);
    }

    #[test]
    fn counts_follow_placements() {
        let mut grid = CompositionGrid::new(3, 2).unwrap();
        grid.place_tile(0, 0, face(Variant::S0, Rotation::Deg0));
        grid.place_tile(0, 1, face(Variant::S1, Rotation::Deg90));
        grid.place_tile(1, 2, face(Variant::S1, Rotation::Deg0));
        let counts = grid.variant_counts();
        assert_eq!(counts.get(Variant::S0), 1);
        assert_eq!(counts.get(Variant::S1), 2);
        assert_eq!(counts.get(Variant::S2), 0);
        assert_eq!(counts.total(), 3);
        let cells: Vec<_> = grid.occupied().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 2)]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::rng::Rng;
    use proptest::prelude::*;

    proptest! {
        /// Resizing keeps the overlapping block and leaves every other cell empty.
        #[test]
        fn resize_preserves_overlap(w in 1usize..8, h in 1usize..8, w2 in 1usize..8, h2 in 1usize..8, seed in 1u64..10_000) {
            let mut grid = CompositionGrid::new(w, h).unwrap();
            grid.fill_random(&mut Rng::new(seed));
            let before = grid.clone();
            prop_assert!(grid.resize(w2, h2));
            for row in 0..h2 {
                for col in 0..w2 {
                    if row < h && col < w {
                        prop_assert_eq!(grid.get(row, col), before.get(row, col));
                    } else {
                        prop_assert!(grid.get(row, col).is_none());
                    }
                }
            }
        }

        /// has_empty_cell is false only when every cell is occupied.
        #[test]
        fn order_gate_matches_occupancy(w in 1usize..6, h in 1usize..6, holes in proptest::collection::vec((0usize..6, 0usize..6), 0..5)) {
            let mut grid = CompositionGrid::new(w, h).unwrap();
            grid.fill_random(&mut Rng::new(11));
            for (row, col) in holes {
                grid.remove_tile(row, col);
            }
            prop_assert_eq!(grid.has_empty_cell(), grid.occupied_count() < w * h);
        }
    }
}
