use serde::{Deserialize, Serialize};

/// Decorative pattern of a tile. Shown to customers as S0/S1/S2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Variant {
    S0 = 0,
    S1 = 1,
    S2 = 2,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::S0, Variant::S1, Variant::S2];
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Variant> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::S0 => "S0",
            Variant::S1 => "S1",
            Variant::S2 => "S2",
        }
    }
}

/// Clockwise tile rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum Rotation {
    #[default]
    Deg0 = 0,
    Deg90 = 90,
    Deg180 = 180,
    Deg270 = 270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    pub fn degrees(self) -> u16 {
        self as u16
    }

    pub fn quarter_turns(self) -> u8 {
        (self.degrees() / 90) as u8
    }

    pub fn from_quarter_turns(turns: u8) -> Rotation {
        Self::ALL[(turns % 4) as usize]
    }

    /// Only exact multiples of 90 below 360 are accepted.
    pub fn from_degrees(degrees: u16) -> Option<Rotation> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// One step clockwise, wrapping 270 -> 0.
    pub fn rotated(self) -> Rotation {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }
}

/// Whether the tiles ship with the hook-and-loop backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum OrderType {
    #[default]
    Regular = 0,
    Magnetic = 1,
}

// Pricing (whole euros).
pub const PRICE_S0: u32 = 7;
pub const PRICE_S1: u32 = 12;
pub const PRICE_S2: u32 = 12;
pub const MAGNETIC_SURCHARGE_PER_TILE: u32 = 3;
/// Physical edge length of one tile.
pub const UNIT_SIZE_CM: u32 = 15;
pub const ORDER_EMAIL: &str = "comingsoon@planerai.com";

// Composition grid.
pub const CELL_PX: f32 = 50.0;
pub const RANDOM_GRID_MIN: usize = 2;
pub const RANDOM_GRID_MAX: usize = 10;
/// Largest composition accepted, in cells.
pub const MAX_GRID_CELLS: usize = 10_000;

// Background field: 100x100 slots centered on the origin, 50px tiles + 1px gap.
pub const FIELD_SIZE: usize = 100;
pub const FIELD_PITCH: f32 = 51.0;
pub const FIELD_SCROLL_ROWS: usize = 10;
/// Extra slots kept around the visible window so panning never shows gaps.
pub const FIELD_WINDOW_BUFFER: i32 = 2;
/// Header band above the field on touch layouts.
pub const HEADER_INSET: f32 = 175.0;

// Sliding puzzle.
pub const DEFAULT_PUZZLE_SIZE: usize = 4;
pub const MIN_PUZZLE_SIZE: usize = 2;
/// Shuffle intensity is `size * size * SHUFFLE_FACTOR` random moves.
pub const SHUFFLE_FACTOR: usize = 10;

/// Remote tile artwork, indexed by `Variant::index()`.
pub const TILE_IMAGE_URLS: [&str; Variant::COUNT] = [
    "https://i.imgur.com/RSSS8zt.png",
    "https://i.imgur.com/6xIAB8j.png",
    "https://i.imgur.com/eRSAL3Z.png",
];
pub const HEADER_IMAGE_URL: &str = "https://i.imgur.com/uYx6gJV.jpeg";

/// Photo of a finished tile as it looks on the wall for a given rotation.
/// S0 is symmetric and has a single photo.
pub fn preview_image_url(variant: Variant, rotation: Rotation) -> &'static str {
    match (variant, rotation) {
        (Variant::S0, _) => "https://i.imgur.com/kn42XZf.jpeg",
        (Variant::S1, Rotation::Deg0 | Rotation::Deg180) => "https://i.imgur.com/1DqOSQE.jpeg",
        (Variant::S1, Rotation::Deg90 | Rotation::Deg270) => "https://i.imgur.com/PjLVbJo.jpeg",
        (Variant::S2, Rotation::Deg0) => "https://i.imgur.com/vE81a6V.jpeg",
        (Variant::S2, Rotation::Deg90) => "https://i.imgur.com/tsLaZSJ.jpeg",
        (Variant::S2, Rotation::Deg180) => "https://i.imgur.com/CC9hB30.jpeg",
        (Variant::S2, Rotation::Deg270) => "https://i.imgur.com/jfTdo1q.jpeg",
    }
}

/// Per-variant unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub prices: [u32; Variant::COUNT],
}

impl PriceTable {
    pub fn price(&self, variant: Variant) -> u32 {
        self.prices[variant.index()]
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        PriceTable {
            prices: [PRICE_S0, PRICE_S1, PRICE_S2],
        }
    }
}

/// Static configuration of the composer. Every field falls back to the
/// constants above when omitted from a JSON override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub prices: PriceTable,
    pub magnetic_surcharge: u32,
    pub unit_size_cm: u32,
    pub field_size: usize,
    pub order_email: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            prices: PriceTable::default(),
            magnetic_surcharge: MAGNETIC_SURCHARGE_PER_TILE,
            unit_size_cm: UNIT_SIZE_CM,
            field_size: FIELD_SIZE,
            order_email: ORDER_EMAIL.to_string(),
        }
    }
}

impl ComposerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
