//! Surface layer for tile-composition apps: pan/zoom camera, pointer input,
//! sprite instances for the host renderer, asset loading and raster export.
//! Knows nothing about variants, prices or puzzles.

pub mod assets;
pub mod camera;
pub mod input;
pub mod raster;
pub mod sprite;

pub use camera::{screen_to_grid_coordinates, visible_tile_window, Camera2D, PinchDelta, TileWindow, Viewport};
pub use input::{InputEvent, InputQueue, PinchTracker};
pub use raster::{RasterCell, RasterError, RasterLayout};
pub use sprite::SpriteInstance;
