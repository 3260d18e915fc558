use serde::{Deserialize, Serialize};

use crate::components::{DEFAULT_PUZZLE_SIZE, MIN_PUZZLE_SIZE, SHUFFLE_FACTOR};
use crate::rng::Rng;

/// Value of the blank cell.
pub const BLANK: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PuzzlePhase {
    Ready = 0,
    Shuffling = 1,
    Playing = 2,
    Won = 3,
    ManuallySolved = 4,
}

/// Arrow key, named after the direction the tile travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    pub fn from_key_code(code: u32) -> Option<ArrowKey> {
        use tessera_engine::input::{KEY_DOWN, KEY_LEFT, KEY_RIGHT, KEY_UP};
        match code {
            KEY_UP => Some(ArrowKey::Up),
            KEY_DOWN => Some(ArrowKey::Down),
            KEY_LEFT => Some(ArrowKey::Left),
            KEY_RIGHT => Some(ArrowKey::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinStats {
    pub moves: u32,
    pub elapsed_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Ignored,
    Moved,
    Won(WinStats),
}

/// Wall-clock stopwatch. Times are seconds from any fixed epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PuzzleTimer {
    started_at: Option<f64>,
    stopped_at: Option<f64>,
}

impl PuzzleTimer {
    pub fn start(&mut self, now: f64) {
        self.started_at = Some(now);
        self.stopped_at = None;
    }

    pub fn stop(&mut self, now: f64) {
        if self.is_running() {
            self.stopped_at = Some(now);
        }
    }

    pub fn reset(&mut self) {
        *self = PuzzleTimer::default();
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    /// Whole seconds elapsed; frozen once stopped.
    pub fn elapsed_secs(&self, now: f64) -> u64 {
        let Some(start) = self.started_at else {
            return 0;
        };
        let end = self.stopped_at.unwrap_or(now);
        (end - start).max(0.0).floor() as u64
    }
}

/// `MM:SS`, minutes keep growing past 99.
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Row-major `1..n²-1` with the blank in the bottom-right corner.
pub fn create_solved_grid(n: usize) -> Vec<u32> {
    let count = n * n;
    let mut tiles: Vec<u32> = (1..count as u32).collect();
    if count > 0 {
        tiles.push(BLANK);
    }
    tiles
}

/// Manhattan distance of exactly one.
pub fn is_adjacent(a: Cell, b: Cell) -> bool {
    a.row.abs_diff(b.row) + a.col.abs_diff(b.col) == 1
}

/// Whether an arbitrary `n x n` layout can be slid back to the solved one.
///
/// Odd widths need an even inversion count. Even widths need the inversion count
/// plus the blank's row (counted from the bottom, starting at 1) to be odd.
pub fn is_solvable(values: &[u32], n: usize) -> bool {
    if n == 0 || values.len() != n * n {
        return false;
    }
    let mut seen = vec![false; values.len()];
    for &v in values {
        match seen.get_mut(v as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }

    let tiles: Vec<u32> = values.iter().copied().filter(|&v| v != BLANK).collect();
    let mut inversions = 0usize;
    for i in 0..tiles.len() {
        for j in i + 1..tiles.len() {
            if tiles[i] > tiles[j] {
                inversions += 1;
            }
        }
    }

    if n % 2 == 1 {
        inversions % 2 == 0
    } else {
        let blank_index = values.iter().position(|&v| v == BLANK).unwrap_or(0);
        let blank_row_from_bottom = n - blank_index / n;
        (inversions + blank_row_from_bottom) % 2 == 1
    }
}

/// Saved game, stored as JSON between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSnapshot {
    pub size: usize,
    pub tiles: Vec<u32>,
    pub moves: u32,
    pub phase: PuzzlePhase,
    pub elapsed_secs: u64,
}

/// Classic `n x n` sliding puzzle with one blank.
#[derive(Debug, Clone)]
pub struct SlidingPuzzle {
    size: usize,
    tiles: Vec<u32>,
    empty: Cell,
    moves: u32,
    phase: PuzzlePhase,
    timer: PuzzleTimer,
    rng: Rng,
}

impl SlidingPuzzle {
    /// Solved board waiting in `Ready`. Sizes below 2 are raised to 2.
    pub fn new(size: usize, seed: u64) -> Self {
        let size = size.max(MIN_PUZZLE_SIZE);
        SlidingPuzzle {
            size,
            tiles: create_solved_grid(size),
            empty: Cell::new(size - 1, size - 1),
            moves: 0,
            phase: PuzzlePhase::Ready,
            timer: PuzzleTimer::default(),
            rng: Rng::new(seed),
        }
    }

    /// Board with a given layout. `None` unless `tiles` is a permutation of `0..size²`.
    pub fn from_tiles(size: usize, tiles: Vec<u32>, seed: u64) -> Option<Self> {
        if size < MIN_PUZZLE_SIZE || tiles.len() != size * size {
            return None;
        }
        let mut sorted = tiles.clone();
        sorted.sort_unstable();
        if sorted.iter().enumerate().any(|(i, &v)| v != i as u32) {
            return None;
        }
        let blank = tiles.iter().position(|&v| v == BLANK)?;
        let mut puzzle = SlidingPuzzle::new(size, seed);
        puzzle.tiles = tiles;
        puzzle.empty = Cell::new(blank / size, blank % size);
        Some(puzzle)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    pub fn value_at(&self, cell: Cell) -> Option<u32> {
        if cell.row >= self.size || cell.col >= self.size {
            return None;
        }
        Some(self.tiles[cell.row * self.size + cell.col])
    }

    pub fn empty(&self) -> Cell {
        self.empty
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn phase(&self) -> PuzzlePhase {
        self.phase
    }

    pub fn timer(&self) -> &PuzzleTimer {
        &self.timer
    }

    pub fn elapsed_secs(&self, now: f64) -> u64 {
        self.timer.elapsed_secs(now)
    }

    pub fn is_solved(&self) -> bool {
        self.tiles == create_solved_grid(self.size)
    }

    /// Cells whose tile could slide into the blank.
    pub fn possible_moves(&self) -> Vec<Cell> {
        let Cell { row, col } = self.empty;
        let mut cells = Vec::with_capacity(4);
        if row > 0 {
            cells.push(Cell::new(row - 1, col));
        }
        if row + 1 < self.size {
            cells.push(Cell::new(row + 1, col));
        }
        if col > 0 {
            cells.push(Cell::new(row, col - 1));
        }
        if col + 1 < self.size {
            cells.push(Cell::new(row, col + 1));
        }
        cells
    }

    fn slide(&mut self, cell: Cell) -> bool {
        if cell.row >= self.size || cell.col >= self.size || !is_adjacent(cell, self.empty) {
            return false;
        }
        let from = cell.row * self.size + cell.col;
        let to = self.empty.row * self.size + self.empty.col;
        self.tiles.swap(from, to);
        self.empty = cell;
        true
    }

    /// Slide the tile at `cell` into the blank and count the move.
    /// Non-adjacent cells are ignored.
    pub fn try_move(&mut self, cell: Cell) -> bool {
        let moved = self.slide(cell);
        if moved {
            self.moves += 1;
        }
        moved
    }

    /// `intensity` random legal slides that do not count as moves.
    /// Returns the cells slid, in order.
    pub fn shuffle(&mut self, intensity: usize) -> Vec<Cell> {
        let previous = self.phase;
        self.phase = PuzzlePhase::Shuffling;
        let mut path = Vec::with_capacity(intensity);
        for _ in 0..intensity {
            let candidates = self.possible_moves();
            if let Some(&cell) = self.rng.pick(&candidates) {
                self.slide(cell);
                path.push(cell);
            }
        }
        self.phase = previous;
        path
    }

    /// Fresh shuffled board with the clock running.
    pub fn new_game(&mut self, now: f64) {
        self.tiles = create_solved_grid(self.size);
        self.empty = Cell::new(self.size - 1, self.size - 1);
        self.shuffle(self.size * self.size * SHUFFLE_FACTOR);
        self.moves = 0;
        self.timer.start(now);
        self.phase = PuzzlePhase::Playing;
        log::info!("puzzle: new {}x{} game", self.size, self.size);
    }

    /// A player tap. Only counts while playing.
    pub fn tap(&mut self, cell: Cell, now: f64) -> MoveOutcome {
        if self.phase != PuzzlePhase::Playing || !self.try_move(cell) {
            return MoveOutcome::Ignored;
        }
        if !self.is_solved() {
            return MoveOutcome::Moved;
        }
        self.timer.stop(now);
        self.phase = PuzzlePhase::Won;
        let stats = WinStats {
            moves: self.moves,
            elapsed_secs: self.timer.elapsed_secs(now),
        };
        log::info!("puzzle: won in {} moves, {}", stats.moves, format_time(stats.elapsed_secs));
        MoveOutcome::Won(stats)
    }

    /// Slide the tile next to the blank in the direction of the arrow.
    pub fn key_move(&mut self, key: ArrowKey, now: f64) -> MoveOutcome {
        let Cell { row, col } = self.empty;
        let target = match key {
            ArrowKey::Up => Some(Cell::new(row + 1, col)),
            ArrowKey::Down => row.checked_sub(1).map(|r| Cell::new(r, col)),
            ArrowKey::Left => Some(Cell::new(row, col + 1)),
            ArrowKey::Right => col.checked_sub(1).map(|c| Cell::new(row, c)),
        };
        match target {
            Some(cell) => self.tap(cell, now),
            None => MoveOutcome::Ignored,
        }
    }

    /// Give up: show the solved board and stop the clock.
    pub fn solve(&mut self, now: f64) -> bool {
        if self.phase != PuzzlePhase::Playing {
            return false;
        }
        self.tiles = create_solved_grid(self.size);
        self.empty = Cell::new(self.size - 1, self.size - 1);
        self.timer.stop(now);
        self.phase = PuzzlePhase::ManuallySolved;
        log::info!("puzzle: solved manually after {} moves", self.moves);
        true
    }

    /// Switch board size; the new board waits in `Ready`.
    pub fn set_size(&mut self, size: usize) -> bool {
        if size < MIN_PUZZLE_SIZE {
            return false;
        }
        self.size = size;
        self.tiles = create_solved_grid(size);
        self.empty = Cell::new(size - 1, size - 1);
        self.moves = 0;
        self.timer.reset();
        self.phase = PuzzlePhase::Ready;
        true
    }

    pub fn snapshot(&self, now: f64) -> PuzzleSnapshot {
        PuzzleSnapshot {
            size: self.size,
            tiles: self.tiles.clone(),
            moves: self.moves,
            phase: self.phase,
            elapsed_secs: self.timer.elapsed_secs(now),
        }
    }

    /// Continue a saved game. A running game resumes with its elapsed time intact.
    /// Rejects snapshots whose tiles are not a valid board.
    pub fn restore(&mut self, snapshot: &PuzzleSnapshot, now: f64) -> bool {
        let Some(mut restored) = SlidingPuzzle::from_tiles(snapshot.size, snapshot.tiles.clone(), 0) else {
            log::warn!("puzzle: ignoring invalid snapshot of size {}", snapshot.size);
            return false;
        };
        restored.rng = self.rng.clone();
        restored.moves = snapshot.moves;
        restored.phase = match snapshot.phase {
            PuzzlePhase::Shuffling => PuzzlePhase::Ready,
            phase => phase,
        };
        let started = now - snapshot.elapsed_secs as f64;
        match restored.phase {
            PuzzlePhase::Playing => restored.timer.start(started),
            PuzzlePhase::Won | PuzzlePhase::ManuallySolved => {
                restored.timer.start(started);
                restored.timer.stop(now);
            }
            _ => {}
        }
        *self = restored;
        true
    }
}

impl Default for SlidingPuzzle {
    fn default() -> Self {
        SlidingPuzzle::new(DEFAULT_PUZZLE_SIZE, 1)
    }
}
