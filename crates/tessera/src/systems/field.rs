use std::collections::HashMap;

use tessera_engine::TileWindow;

use crate::grid::{Tile, TileFace, TileId};
use crate::rng::Rng;

/// A background tile together with the slot it occupies.
/// Slot coordinates are stable; only the tile in them changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub col: i32,
    pub row: i32,
    pub tile: Tile,
}

/// The self-replenishing pool of draggable tiles behind the composition grid.
/// Any tile that leaves (placed in the grid, or dragged onto another field tile)
/// is immediately replaced by a freshly drawn one, so the field never thins out.
#[derive(Debug, Clone)]
pub struct BackgroundField {
    slots: Vec<FieldSlot>,
    index: HashMap<TileId, usize>,
    rng: Rng,
    next_serial: u64,
}

impl BackgroundField {
    /// A `size x size` block of random tiles centered on the origin:
    /// columns and rows run from `-size/2` to `size - size/2 - 1`.
    pub fn new(size: usize, seed: u64) -> Self {
        let mut field = BackgroundField {
            slots: Vec::with_capacity(size * size),
            index: HashMap::with_capacity(size * size),
            rng: Rng::new(seed),
            next_serial: 0,
        };
        let half = (size / 2) as i32;
        for row in 0..size as i32 {
            for col in 0..size as i32 {
                field.push_slot(col - half, row - half);
            }
        }
        field
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub fn get(&self, id: TileId) -> Option<&FieldSlot> {
        self.index.get(&id).map(|&i| &self.slots[i])
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.index.contains_key(&id)
    }

    /// A new random face: uniform variant and uniform rotation.
    pub fn draw_random_tile(&mut self) -> TileFace {
        TileFace::random(&mut self.rng)
    }

    fn next_id(&mut self) -> TileId {
        let id = TileId::field(self.next_serial);
        self.next_serial += 1;
        id
    }

    fn push_slot(&mut self, col: i32, row: i32) {
        let id = self.next_id();
        let face = self.draw_random_tile();
        self.index.insert(id, self.slots.len());
        self.slots.push(FieldSlot {
            col,
            row,
            tile: Tile::new(id, face),
        });
    }

    /// Put a fresh tile with a new identity into slot `i`.
    fn replenish(&mut self, i: usize) {
        let old = self.slots[i].tile.id;
        let id = self.next_id();
        let face = self.draw_random_tile();
        self.index.remove(&old);
        self.index.insert(id, i);
        self.slots[i].tile = Tile::new(id, face);
    }

    /// Take the face of tile `id` out of the field and refill its slot.
    /// Afterwards no tile with `id` exists; the slot holds a new tile.
    pub fn consume_and_replace(&mut self, id: TileId) -> Option<TileFace> {
        let Some(&i) = self.index.get(&id) else {
            log::warn!("consume of unknown field tile {:?}", id);
            return None;
        };
        let face = self.slots[i].tile.face();
        self.replenish(i);
        Some(face)
    }

    /// Drag `source` onto `target`: the target takes the source's face and the
    /// source slot is refilled with a fresh random tile.
    /// False for unknown ids or a drop onto itself.
    pub fn swap(&mut self, source: TileId, target: TileId) -> bool {
        if source == target {
            return false;
        }
        let (Some(&si), Some(&ti)) = (self.index.get(&source), self.index.get(&target)) else {
            log::warn!("swap with unknown field tile {:?} -> {:?}", source, target);
            return false;
        };
        let face = self.slots[si].tile.face();
        let target_tile = &mut self.slots[ti].tile;
        target_tile.variant = face.variant;
        target_tile.rotation = face.rotation;
        self.replenish(si);
        true
    }

    /// Turn a field tile by 90 degrees without consuming it.
    pub fn rotate_in_place(&mut self, id: TileId) -> bool {
        match self.index.get(&id) {
            Some(&i) => {
                self.slots[i].tile.rotate();
                true
            }
            None => false,
        }
    }

    /// Append `rows` full rows of `cols` slots below the current bottom edge,
    /// spanning the same columns as a centered `cols`-wide field.
    pub fn extend_rows(&mut self, rows: usize, cols: usize) {
        let start_row = self.slots.iter().map(|s| s.row).max().map_or(0, |r| r + 1);
        let half = (cols / 2) as i32;
        for row in 0..rows as i32 {
            for col in 0..cols as i32 {
                self.push_slot(col - half, start_row + row);
            }
        }
        log::debug!("field extended by {} rows to {} tiles", rows, self.slots.len());
    }

    /// Smallest `h` such that every slot lies in `-h..h` on both axes.
    pub fn half_extent(&self) -> i32 {
        self.slots
            .iter()
            .map(|s| (-s.col).max(s.col + 1).max(-s.row).max(s.row + 1))
            .max()
            .unwrap_or(0)
    }

    pub fn tiles_in_window<'a>(&'a self, window: &'a TileWindow) -> impl Iterator<Item = &'a FieldSlot> + 'a {
        self.slots.iter().filter(move |s| window.contains(s.col, s.row))
    }
}
