use std::cell::RefCell;

use image::RgbaImage;
use tessera_engine::assets::AssetManager;
use tessera_engine::sprite::as_floats;
use tessera_engine::{InputEvent, Viewport};
use wasm_bindgen::prelude::*;

use crate::components::{
    preview_image_url, ComposerConfig, OrderType, Rotation, Variant, HEADER_IMAGE_URL, HEADER_INSET, TILE_IMAGE_URLS,
};
use crate::grid::TileId;
use crate::state::{ComposerAction, ComposerEvent, ComposerState};
use crate::systems::export::{export_file_name, export_jpeg};
use crate::systems::order::{composition_title, OrderDate, OrderForm};
use crate::systems::persist::{load_json, save_json, take_intro_flag, LocalStorage, PUZZLE_STATE_KEY};
use crate::systems::puzzle::{format_time, ArrowKey, Cell, MoveOutcome, PuzzleSnapshot, SlidingPuzzle};

thread_local! {
    static COMPOSER: RefCell<Option<ComposerState>> = RefCell::new(None);
    static PUZZLE: RefCell<Option<SlidingPuzzle>> = RefCell::new(None);
    static TEXTURES: RefCell<Vec<RgbaImage>> = RefCell::new(Vec::new());
}

fn with_composer<R: Default>(f: impl FnOnce(&mut ComposerState) -> R) -> R {
    COMPOSER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(state) => f(state),
        None => {
            log::warn!("tessera-sim: composer not initialized, call init_composer() first");
            R::default()
        }
    })
}

fn with_puzzle<R: Default>(f: impl FnOnce(&mut SlidingPuzzle) -> R) -> R {
    PUZZLE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(puzzle) => f(puzzle),
        None => {
            log::warn!("tessera-sim: puzzle not initialized, call init_puzzle() first");
            R::default()
        }
    })
}

/// Seconds since the epoch, from the browser clock.
fn now_secs() -> f64 {
    js_sys::Date::now() / 1000.0
}

/// Apply an action and report whether it changed anything.
fn dispatch(action: ComposerAction) -> bool {
    with_composer(|c| !c.apply(action).is_empty())
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// `config_json` may be empty for the built-in prices and sizes.
#[wasm_bindgen]
pub fn init_composer(seed: f64, width: f32, height: f32, config_json: &str) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        ComposerConfig::default()
    } else {
        ComposerConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let state = ComposerState::new(config, Viewport::new(width, height, HEADER_INSET), seed as u64);
    COMPOSER.with(|cell| {
        *cell.borrow_mut() = Some(state);
    });
    log::info!("tessera-sim: composer initialized with seed {}", seed as u64);
    Ok(())
}

#[wasm_bindgen]
pub fn resize_viewport(width: f32, height: f32) {
    with_composer(|c| c.resize_viewport(Viewport::new(width, height, HEADER_INSET)));
}

#[wasm_bindgen]
pub fn start_grid(horizontal: &str, vertical: &str) -> bool {
    dispatch(ComposerAction::Start {
        horizontal: horizontal.to_string(),
        vertical: vertical.to_string(),
    })
}

#[wasm_bindgen]
pub fn clear_grid() -> bool {
    dispatch(ComposerAction::Clear)
}

#[wasm_bindgen]
pub fn restart_grid() -> bool {
    dispatch(ComposerAction::Restart)
}

#[wasm_bindgen]
pub fn randomize_grid() -> bool {
    dispatch(ComposerAction::Randomize)
}

/// Field tiles are addressed by the key carried in their sprite.
#[wasm_bindgen]
pub fn rotate_field_tile(key: f64) -> bool {
    dispatch(ComposerAction::RotateFieldTile(TileId::field(key as u64)))
}

#[wasm_bindgen]
pub fn quick_place(key: f64) -> bool {
    dispatch(ComposerAction::QuickPlace(TileId::field(key as u64)))
}

#[wasm_bindgen]
pub fn rotate_grid_tile(row: u32, col: u32) -> bool {
    dispatch(ComposerAction::RotateGridTile {
        row: row as usize,
        col: col as usize,
    })
}

#[wasm_bindgen]
pub fn remove_grid_tile(row: u32, col: u32) -> bool {
    dispatch(ComposerAction::RemoveGridTile {
        row: row as usize,
        col: col as usize,
    })
}

#[wasm_bindgen]
pub fn begin_drag(key: f64) -> bool {
    dispatch(ComposerAction::BeginDrag(TileId::field(key as u64)))
}

#[wasm_bindgen]
pub fn drag_move(x: f32, y: f32) {
    dispatch(ComposerAction::DragMove { x, y });
}

#[wasm_bindgen]
pub fn drop_on_field(key: f64) -> bool {
    dispatch(ComposerAction::DropOnField(TileId::field(key as u64)))
}

/// Drop at a screen point over a grid whose top-left cell is drawn at `(origin_x, origin_y)`.
#[wasm_bindgen]
pub fn drop_on_grid(x: f32, y: f32, origin_x: f32, origin_y: f32, cell_px: f32) -> bool {
    let (row, col) = tessera_engine::screen_to_grid_coordinates(
        glam::Vec2::new(x, y),
        glam::Vec2::new(origin_x, origin_y),
        cell_px,
    );
    dispatch(ComposerAction::DropOnGrid { row, col })
}

#[wasm_bindgen]
pub fn drop_outside() {
    dispatch(ComposerAction::DropOutside);
}

#[wasm_bindgen]
pub fn cancel_drag() {
    dispatch(ComposerAction::CancelDrag);
}

#[wasm_bindgen]
pub fn extend_field() {
    dispatch(ComposerAction::ExtendField);
}

/// order_type: 0 = regular, 1 = magnetic
#[wasm_bindgen]
pub fn set_order_type(order_type: u8) {
    let order_type = match order_type {
        1 => OrderType::Magnetic,
        _ => OrderType::Regular,
    };
    dispatch(ComposerAction::SetOrderType(order_type));
}

/// 0 = no grid, 1 = open the order dialog, 2 = confirm empty cells first.
#[wasm_bindgen]
pub fn request_order() -> u8 {
    with_composer(|c| match c.apply(ComposerAction::RequestOrder).first() {
        Some(ComposerEvent::OpenOrderDialog) => 1,
        Some(ComposerEvent::ConfirmEmptyCells(_)) => 2,
        _ => 0,
    })
}

/// Returns the mailto URL, or an error listing the missing form fields.
#[wasm_bindgen]
pub fn submit_order(
    name: &str,
    address: &str,
    postal_code: &str,
    country: &str,
    phone: &str,
    email: &str,
) -> Result<String, JsValue> {
    let form = OrderForm {
        name: name.to_string(),
        address: address.to_string(),
        postal_code: postal_code.to_string(),
        country: country.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
    };
    let action = ComposerAction::SubmitOrder {
        form,
        date: OrderDate::today(),
    };
    let outcome: Option<Result<String, String>> = with_composer(|c| {
        c.apply(action).iter().find_map(|event| match event {
            ComposerEvent::OrderDrafted(draft) => Some(Ok(draft.mailto.clone())),
            ComposerEvent::OrderIncomplete(fields) => Some(Err(format!(
                "missing fields: {}",
                fields.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
            ))),
            _ => None,
        })
    });
    match outcome {
        Some(Ok(mailto)) => Ok(mailto),
        Some(Err(message)) => Err(JsValue::from_str(&message)),
        None => Err(JsValue::from_str("no composition to order")),
    }
}

/// kind: 0 = down, 1 = move, 2 = up, anything else = cancel
#[wasm_bindgen]
pub fn queue_pointer(kind: u8, id: u32, x: f32, y: f32) {
    let event = match kind {
        0 => InputEvent::PointerDown { id, x, y },
        1 => InputEvent::PointerMove { id, x, y },
        2 => InputEvent::PointerUp { id, x, y },
        _ => InputEvent::PointerCancel { id },
    };
    with_composer(|c| c.queue_input(event));
}

/// Handle queued input once per frame. Returns true when the view changed.
#[wasm_bindgen]
pub fn tick_composer() -> bool {
    with_composer(|c| c.process_input())
}

/// Returns a pointer to the sprite buffer (8 floats per sprite).
#[wasm_bindgen]
pub fn get_render_buffer_ptr() -> *const f32 {
    COMPOSER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |c| as_floats(&c.render_buffer).as_ptr())
    })
}

/// Returns the number of sprites.
#[wasm_bindgen]
pub fn get_render_buffer_len() -> u32 {
    with_composer(|c| c.render_buffer_len() as u32)
}

#[wasm_bindgen]
pub fn get_camera_scale() -> f32 {
    with_composer(|c| c.camera.scale)
}

#[wasm_bindgen]
pub fn get_camera_translation() -> Vec<f32> {
    with_composer(|c| vec![c.camera.translation.x, c.camera.translation.y])
}

#[wasm_bindgen]
pub fn get_grid_width() -> u32 {
    with_composer(|c| c.grid.as_ref().map_or(0, |g| g.width() as u32))
}

#[wasm_bindgen]
pub fn get_grid_height() -> u32 {
    with_composer(|c| c.grid.as_ref().map_or(0, |g| g.height() as u32))
}

/// Order summary as JSON, or an empty string without a grid.
#[wasm_bindgen]
pub fn get_order_summary() -> String {
    with_composer(|c| {
        c.summary()
            .and_then(|s| serde_json::to_string(&s).ok())
            .unwrap_or_default()
    })
}

#[wasm_bindgen]
pub fn get_composition_title() -> String {
    with_composer(|c| {
        c.summary()
            .map(|s| composition_title(&s.counts, &OrderDate::today()))
            .unwrap_or_default()
    })
}

#[wasm_bindgen]
pub fn get_export_file_name() -> String {
    let title = get_composition_title();
    if title.is_empty() {
        return title;
    }
    export_file_name(&title)
}

/// Artwork URL for a variant index (sprite texture index).
#[wasm_bindgen]
pub fn get_tile_image_url(variant: u32) -> String {
    TILE_IMAGE_URLS
        .get(variant as usize)
        .map(|url| url.to_string())
        .unwrap_or_default()
}

/// Photo of the finished tile for the preview dialog.
#[wasm_bindgen]
pub fn get_preview_image_url(variant: u32, degrees: u16) -> String {
    match (Variant::from_index(variant as usize), Rotation::from_degrees(degrees)) {
        (Some(variant), Some(rotation)) => preview_image_url(variant, rotation).to_string(),
        _ => String::new(),
    }
}

#[wasm_bindgen]
pub fn get_header_image_url() -> String {
    HEADER_IMAGE_URL.to_string()
}

/// Fetch the variant artwork once; export needs it decoded.
#[wasm_bindgen]
pub async fn load_textures() -> Result<(), JsValue> {
    let textures = AssetManager::new("").load_rgba_images(&TILE_IMAGE_URLS).await?;
    TEXTURES.with(|cell| *cell.borrow_mut() = textures);
    log::info!("tessera-sim: {} textures loaded", Variant::COUNT);
    Ok(())
}

/// JPEG bytes of the current composition.
#[wasm_bindgen]
pub fn export_composition_jpeg() -> Result<Vec<u8>, JsValue> {
    let result = TEXTURES.with(|textures| {
        let textures = textures.borrow();
        with_composer(|c| c.grid.as_ref().map(|grid| export_jpeg(grid, &textures)))
    });
    match result {
        Some(Ok(bytes)) => Ok(bytes),
        Some(Err(e)) => Err(JsValue::from_str(&e.to_string())),
        None => Err(JsValue::from_str("no composition to export")),
    }
}

// ---------------------------------------------------------------------------
// Intro dialog
// ---------------------------------------------------------------------------

/// True the first time the app runs in this browser.
#[wasm_bindgen]
pub fn should_show_intro() -> bool {
    match LocalStorage::open() {
        Ok(mut store) => take_intro_flag(&mut store),
        Err(e) => {
            log::warn!("tessera-sim: {}", e);
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Sliding puzzle
// ---------------------------------------------------------------------------

fn save_puzzle(puzzle: &SlidingPuzzle) {
    let snapshot = puzzle.snapshot(now_secs());
    let saved = LocalStorage::open().and_then(|mut store| save_json(&mut store, PUZZLE_STATE_KEY, &snapshot));
    if let Err(e) = saved {
        log::error!("tessera-sim: puzzle save failed: {}", e);
    }
}

/// Create the puzzle, resuming the saved game if there is one.
#[wasm_bindgen]
pub fn init_puzzle(size: u32, seed: f64) {
    let mut puzzle = SlidingPuzzle::new(size as usize, seed as u64);
    if let Ok(store) = LocalStorage::open() {
        if let Some(snapshot) = load_json::<PuzzleSnapshot>(&store, PUZZLE_STATE_KEY) {
            puzzle.restore(&snapshot, now_secs());
        }
    }
    PUZZLE.with(|cell| {
        *cell.borrow_mut() = Some(puzzle);
    });
}

#[wasm_bindgen]
pub fn puzzle_new_game() {
    with_puzzle(|p| {
        p.new_game(now_secs());
        save_puzzle(p);
    });
}

fn outcome_code(outcome: MoveOutcome) -> u8 {
    match outcome {
        MoveOutcome::Ignored => 0,
        MoveOutcome::Moved => 1,
        MoveOutcome::Won(_) => 2,
    }
}

/// 0 = ignored, 1 = moved, 2 = won
#[wasm_bindgen]
pub fn puzzle_tap(row: u32, col: u32) -> u8 {
    with_puzzle(|p| {
        let outcome = p.tap(Cell::new(row as usize, col as usize), now_secs());
        if outcome != MoveOutcome::Ignored {
            save_puzzle(p);
        }
        outcome_code(outcome)
    })
}

#[wasm_bindgen]
pub fn puzzle_key(key_code: u32) -> u8 {
    let Some(key) = ArrowKey::from_key_code(key_code) else {
        return 0;
    };
    with_puzzle(|p| {
        let outcome = p.key_move(key, now_secs());
        if outcome != MoveOutcome::Ignored {
            save_puzzle(p);
        }
        outcome_code(outcome)
    })
}

#[wasm_bindgen]
pub fn puzzle_solve() -> bool {
    with_puzzle(|p| {
        let solved = p.solve(now_secs());
        if solved {
            save_puzzle(p);
        }
        solved
    })
}

#[wasm_bindgen]
pub fn puzzle_set_size(size: u32) -> bool {
    with_puzzle(|p| p.set_size(size as usize))
}

/// Row-major tile values, 0 for the blank.
#[wasm_bindgen]
pub fn puzzle_tiles() -> Vec<u32> {
    with_puzzle(|p| p.tiles().to_vec())
}

#[wasm_bindgen]
pub fn puzzle_size() -> u32 {
    with_puzzle(|p| p.size() as u32)
}

#[wasm_bindgen]
pub fn puzzle_moves() -> u32 {
    with_puzzle(|p| p.moves())
}

#[wasm_bindgen]
pub fn puzzle_phase() -> u8 {
    with_puzzle(|p| p.phase() as u8)
}

/// Elapsed time as `MM:SS`.
#[wasm_bindgen]
pub fn puzzle_time() -> String {
    with_puzzle(|p| format_time(p.elapsed_secs(now_secs())))
}
