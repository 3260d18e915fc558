use glam::Vec2;
use tessera_engine::sprite::{LAYER_DRAG, LAYER_FIELD, LAYER_GRID};
use tessera_engine::{visible_tile_window, Camera2D, InputEvent, InputQueue, PinchTracker, SpriteInstance, Viewport};

use crate::components::{
    ComposerConfig, OrderType, CELL_PX, FIELD_PITCH, FIELD_SCROLL_ROWS, FIELD_WINDOW_BUFFER, RANDOM_GRID_MAX,
    RANDOM_GRID_MIN,
};
use crate::grid::{parse_dimensions, CompositionGrid, TileId};
use crate::rng::Rng;
use crate::systems::field::BackgroundField;
use crate::systems::order::{draft_order, order_gate, OrderDate, OrderDraft, OrderField, OrderForm, OrderGate, OrderError};
use crate::systems::pricing::{summarize, OrderSummary};

/// Alpha of a field tile while it is being dragged.
const DRAG_SOURCE_ALPHA: f32 = 0.4;

/// A field tile picked up by the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub tile: TileId,
    /// Last pointer position in screen space; unset until the first move.
    pub touch: Option<Vec2>,
}

/// Everything the host can ask the composer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerAction {
    /// Create the grid, or resize it keeping the overlapping cells.
    Start { horizontal: String, vertical: String },
    Clear,
    /// Forget the grid entirely.
    Restart,
    /// New grid of random size filled with random tiles.
    Randomize,
    RotateFieldTile(TileId),
    /// Double-click: move a field tile into the first empty grid cell.
    QuickPlace(TileId),
    RotateGridTile { row: usize, col: usize },
    RemoveGridTile { row: usize, col: usize },
    BeginDrag(TileId),
    DragMove { x: f32, y: f32 },
    DropOnField(TileId),
    /// Signed so drops left of or above the grid arrive as negative cells.
    DropOnGrid { row: i64, col: i64 },
    DropOutside,
    CancelDrag,
    /// Infinite scroll: append rows under the field.
    ExtendField,
    SetOrderType(OrderType),
    RequestOrder,
    SubmitOrder { form: OrderForm, date: OrderDate },
}

/// What happened while applying an action. The host reacts to these.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    GridStarted { width: usize, height: usize },
    GridResized { width: usize, height: usize },
    GridCleared,
    GridDestroyed,
    TilePlaced { row: usize, col: usize, id: TileId },
    PlacementRejected,
    GridTileRotated { row: usize, col: usize },
    GridTileRemoved { row: usize, col: usize },
    FieldTileRotated(TileId),
    FieldTilesSwapped { target: TileId },
    FieldExtended { tiles: usize },
    DragStarted(TileId),
    DragEnded,
    OrderTypeChanged(OrderType),
    OpenOrderDialog,
    ConfirmEmptyCells(usize),
    OrderIncomplete(Vec<OrderField>),
    OrderDrafted(OrderDraft),
}

/// The single owner of composer state. Every mutation goes through `apply`.
pub struct ComposerState {
    pub config: ComposerConfig,
    /// `None` until dimensions are entered.
    pub grid: Option<CompositionGrid>,
    pub field: BackgroundField,
    pub order_type: OrderType,
    pub drag: Option<DragSession>,
    pub camera: Camera2D,
    pub pinch: PinchTracker,
    pub input: InputQueue,
    /// Events produced by the last `apply`.
    pub events: Vec<ComposerEvent>,
    pub render_buffer: Vec<SpriteInstance>,
    rng: Rng,
}

impl ComposerState {
    pub fn new(config: ComposerConfig, viewport: Viewport, seed: u64) -> Self {
        let field = BackgroundField::new(config.field_size, seed);
        let camera = Camera2D::new(viewport, config.field_size as f32 * FIELD_PITCH);
        let mut state = ComposerState {
            config,
            grid: None,
            field,
            order_type: OrderType::Regular,
            drag: None,
            camera,
            pinch: PinchTracker::new(),
            input: InputQueue::new(),
            events: Vec::new(),
            render_buffer: Vec::new(),
            rng: Rng::new(seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15),
        };
        state.rebuild_render_buffer();
        state
    }

    /// Apply one action and return the events it produced.
    pub fn apply(&mut self, action: ComposerAction) -> &[ComposerEvent] {
        self.events.clear();
        match action {
            ComposerAction::Start { horizontal, vertical } => self.start(&horizontal, &vertical),
            ComposerAction::Clear => {
                if let Some(grid) = self.grid.as_mut() {
                    grid.clear();
                    self.events.push(ComposerEvent::GridCleared);
                }
            }
            ComposerAction::Restart => {
                if self.grid.take().is_some() {
                    self.drag = None;
                    self.camera.fit();
                    self.events.push(ComposerEvent::GridDestroyed);
                    log::info!("composer: restarted");
                }
            }
            ComposerAction::Randomize => self.randomize(),
            ComposerAction::RotateFieldTile(id) => {
                if self.field.rotate_in_place(id) {
                    self.events.push(ComposerEvent::FieldTileRotated(id));
                }
            }
            ComposerAction::QuickPlace(id) => self.quick_place(id),
            ComposerAction::RotateGridTile { row, col } => {
                if self.grid.as_mut().is_some_and(|g| g.rotate_tile(row, col)) {
                    self.events.push(ComposerEvent::GridTileRotated { row, col });
                }
            }
            ComposerAction::RemoveGridTile { row, col } => {
                if self.grid.as_mut().and_then(|g| g.remove_tile(row, col)).is_some() {
                    self.events.push(ComposerEvent::GridTileRemoved { row, col });
                }
            }
            ComposerAction::BeginDrag(id) => self.begin_drag(id),
            ComposerAction::DragMove { x, y } => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.touch = Some(Vec2::new(x, y));
                }
            }
            ComposerAction::DropOnField(target) => {
                if let Some(drag) = self.end_drag() {
                    if self.field.swap(drag.tile, target) {
                        self.events.push(ComposerEvent::FieldTilesSwapped { target });
                    }
                }
            }
            ComposerAction::DropOnGrid { row, col } => {
                if let Some(drag) = self.end_drag() {
                    self.drop_on_grid(drag.tile, row, col);
                }
            }
            ComposerAction::DropOutside | ComposerAction::CancelDrag => {
                self.end_drag();
            }
            ComposerAction::ExtendField => {
                self.field.extend_rows(FIELD_SCROLL_ROWS, self.config.field_size);
                self.camera
                    .set_world_size(self.field.half_extent() as f32 * 2.0 * FIELD_PITCH);
                self.events.push(ComposerEvent::FieldExtended { tiles: self.field.len() });
            }
            ComposerAction::SetOrderType(order_type) => {
                if self.order_type != order_type {
                    self.order_type = order_type;
                    self.events.push(ComposerEvent::OrderTypeChanged(order_type));
                }
            }
            ComposerAction::RequestOrder => {
                if let Some(grid) = self.grid.as_ref() {
                    self.events.push(match order_gate(grid) {
                        OrderGate::Proceed => ComposerEvent::OpenOrderDialog,
                        OrderGate::ConfirmEmptyCells(n) => ComposerEvent::ConfirmEmptyCells(n),
                    });
                }
            }
            ComposerAction::SubmitOrder { form, date } => self.submit_order(&form, &date),
        }
        self.rebuild_render_buffer();
        &self.events
    }

    fn start(&mut self, horizontal: &str, vertical: &str) {
        let Some((width, height)) = parse_dimensions(horizontal, vertical) else {
            log::debug!("composer: ignoring dimensions {:?} x {:?}", horizontal, vertical);
            return;
        };
        match self.grid.as_mut() {
            Some(grid) => {
                if grid.resize(width, height) {
                    self.events.push(ComposerEvent::GridResized { width, height });
                }
            }
            None => {
                self.grid = CompositionGrid::new(width, height);
                self.camera.reset();
                self.events.push(ComposerEvent::GridStarted { width, height });
                log::info!("composer: started {}x{} grid", width, height);
            }
        }
    }

    fn randomize(&mut self) {
        let width = self.rng.range_inclusive(RANDOM_GRID_MIN, RANDOM_GRID_MAX);
        let height = self.rng.range_inclusive(RANDOM_GRID_MIN, RANDOM_GRID_MAX);
        let Some(mut grid) = CompositionGrid::new(width, height) else {
            return;
        };
        grid.fill_random(&mut self.rng);
        self.grid = Some(grid);
        self.camera.reset();
        self.events.push(ComposerEvent::GridStarted { width, height });
        log::info!("composer: random {}x{} composition", width, height);
    }

    fn quick_place(&mut self, id: TileId) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if !grid.has_empty_cell() || !self.field.contains(id) {
            self.events.push(ComposerEvent::PlacementRejected);
            return;
        }
        let Some(face) = self.field.consume_and_replace(id) else {
            return;
        };
        if let Some((row, col)) = grid.place_first_empty(face) {
            if let Some(tile) = grid.get(row, col) {
                self.events.push(ComposerEvent::TilePlaced { row, col, id: tile.id });
            }
        }
    }

    fn begin_drag(&mut self, id: TileId) {
        if !self.field.contains(id) {
            log::warn!("composer: drag of unknown tile {:?}", id);
            return;
        }
        self.drag = Some(DragSession { tile: id, touch: None });
        self.events.push(ComposerEvent::DragStarted(id));
    }

    /// Every drag exit goes through here.
    fn end_drag(&mut self) -> Option<DragSession> {
        let drag = self.drag.take()?;
        self.events.push(ComposerEvent::DragEnded);
        Some(drag)
    }

    fn drop_on_grid(&mut self, source: TileId, row: i64, col: i64) {
        // The source slot is refilled even when the drop misses the grid.
        let Some(face) = self.field.consume_and_replace(source) else {
            return;
        };
        match self.grid.as_mut().and_then(|g| g.place_tile(row, col, face)) {
            Some(id) => self.events.push(ComposerEvent::TilePlaced {
                row: row as usize,
                col: col as usize,
                id,
            }),
            None => {
                log::debug!("composer: drop at ({}, {}) outside the grid", row, col);
                self.events.push(ComposerEvent::PlacementRejected);
            }
        }
    }

    fn submit_order(&mut self, form: &OrderForm, date: &OrderDate) {
        let Some(summary) = self.summary() else {
            return;
        };
        match draft_order(form, &summary, &self.config.prices, self.order_type, date, &self.config.order_email) {
            Ok(draft) => {
                log::info!("composer: order drafted, total {}", summary.total);
                self.events.push(ComposerEvent::OrderDrafted(draft));
            }
            Err(OrderError::MissingFields(fields)) => {
                self.events.push(ComposerEvent::OrderIncomplete(fields));
            }
        }
    }

    /// Order summary for the current grid, recomputed on every call.
    pub fn summary(&self) -> Option<OrderSummary> {
        self.grid.as_ref().map(|g| summarize(g, &self.config, self.order_type))
    }

    /// Route raw pointer input to the pinch tracker. A cancelled pointer also
    /// abandons any drag in progress. Returns true when the camera moved.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if let InputEvent::PointerCancel { .. } = event {
            if self.drag.take().is_some() {
                log::debug!("composer: drag abandoned");
            }
        }
        let Some(delta) = self.pinch.handle(event) else {
            return false;
        };
        self.camera.apply_pinch(delta);
        self.rebuild_render_buffer();
        true
    }

    /// Queue raw input to be handled on the next `process_input`.
    pub fn queue_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Drain queued input. Returns true when the camera moved.
    pub fn process_input(&mut self) -> bool {
        let mut moved = false;
        for event in self.input.drain() {
            moved |= self.handle_input(event);
        }
        moved
    }

    pub fn resize_viewport(&mut self, viewport: Viewport) {
        self.camera.resize(viewport);
        self.rebuild_render_buffer();
    }

    /// Field tiles in view (world space) followed by grid cells (grid space),
    /// then the dragged tile under the pointer (screen space).
    pub fn rebuild_render_buffer(&mut self) {
        self.render_buffer.clear();

        let window = visible_tile_window(&self.camera, FIELD_PITCH, FIELD_WINDOW_BUFFER, self.field.half_extent());
        let dragged = self.drag.map(|d| d.tile);
        for slot in self.field.tiles_in_window(&window) {
            let tile = slot.tile;
            let alpha = if dragged == Some(tile.id) { DRAG_SOURCE_ALPHA } else { 1.0 };
            self.render_buffer.push(
                SpriteInstance::new(
                    slot.col as f32 * FIELD_PITCH,
                    slot.row as f32 * FIELD_PITCH,
                    CELL_PX,
                    tile.variant.index() as u32,
                )
                .with_rotation(tile.rotation.degrees() as f32)
                .with_alpha(alpha)
                .with_layer(LAYER_FIELD)
                .with_key(tile.id.serial),
            );
        }

        if let Some(grid) = self.grid.as_ref() {
            for (row, col, tile) in grid.occupied() {
                self.render_buffer.push(
                    SpriteInstance::new(col as f32 * CELL_PX, row as f32 * CELL_PX, CELL_PX, tile.variant.index() as u32)
                        .with_rotation(tile.rotation.degrees() as f32)
                        .with_layer(LAYER_GRID)
                        .with_key(tile.id.serial),
                );
            }
        }

        if let Some(DragSession { tile, touch: Some(at) }) = self.drag {
            if let Some(slot) = self.field.get(tile) {
                let half = CELL_PX / 2.0;
                self.render_buffer.push(
                    SpriteInstance::new(at.x - half, at.y - half, CELL_PX, slot.tile.variant.index() as u32)
                        .with_rotation(slot.tile.rotation.degrees() as f32)
                        .with_layer(LAYER_DRAG)
                        .with_key(tile.serial),
                );
            }
        }
    }

    pub fn render_buffer_ptr(&self) -> *const SpriteInstance {
        self.render_buffer.as_ptr()
    }

    pub fn render_buffer_len(&self) -> usize {
        self.render_buffer.len()
    }
}
