use glam::Vec2;

/// Screen area the camera renders into, in CSS pixels.
/// `top_inset` is the band reserved for the header above the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub top_inset: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, top_inset: f32) -> Self {
        Self {
            width,
            height,
            top_inset,
        }
    }

    /// Height left for the field once the header band is removed.
    pub fn usable_height(&self) -> f32 {
        (self.height - self.top_inset).max(0.0)
    }

    /// Center of the usable area in screen space.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.width / 2.0,
            self.top_inset + self.usable_height() / 2.0,
        )
    }
}

/// Change requested by a two-finger gesture, relative to the previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchDelta {
    /// Ratio of the current finger distance to the previous one.
    pub scale_factor: f32,
    /// Movement of the finger midpoint in screen pixels.
    pub pan: Vec2,
}

/// Pan/zoom camera over a square world of `world_size` pixels centered on the origin.
///
/// A world point `w` lands on screen at `translation + w * scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    pub scale: f32,
    pub translation: Vec2,
    pub viewport: Viewport,
    /// Edge length of the world in unscaled pixels.
    pub world_size: f32,
    pub max_scale: f32,
}

impl Camera2D {
    pub const DEFAULT_MAX_SCALE: f32 = 1.0;
    /// Initial zoom relative to the fit-all scale.
    pub const FIT_MARGIN: f32 = 0.8;

    pub fn new(viewport: Viewport, world_size: f32) -> Self {
        let mut camera = Self {
            scale: 1.0,
            translation: Vec2::ZERO,
            viewport,
            world_size,
            max_scale: Self::DEFAULT_MAX_SCALE,
        };
        camera.fit();
        camera
    }

    /// Smallest scale at which the whole world fits the usable area.
    pub fn min_scale(&self) -> f32 {
        if self.world_size <= 0.0 {
            return self.max_scale;
        }
        let horiz = self.viewport.width / self.world_size;
        let vert = self.viewport.usable_height() / self.world_size;
        horiz.min(vert).min(self.max_scale)
    }

    /// Zoom out to slightly less than fit-all and center the world under the header.
    pub fn fit(&mut self) {
        self.scale = self.min_scale() * Self::FIT_MARGIN;
        self.translation = self.viewport.center();
    }

    /// Drop every transform; used when a composition grid takes over the screen.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.translation = Vec2::ZERO;
    }

    /// Grow or shrink the world. The current transform is left alone; the new
    /// zoom and pan limits apply from the next pinch or resize.
    pub fn set_world_size(&mut self, world_size: f32) {
        self.world_size = world_size;
    }

    /// Update the viewport (window resize) and re-clamp the current transform.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.scale = self.scale.clamp(self.min_scale(), self.max_scale);
        self.translation = self.clamp_translation(self.translation, self.scale);
    }

    /// Translation range that keeps the world center within half a scaled world
    /// of the viewport center, so the field never slides fully off screen.
    pub fn pan_bounds(&self, scale: f32) -> (Vec2, Vec2) {
        let half = Vec2::splat(self.world_size * scale / 2.0);
        let center = self.viewport.center();
        (center - half, center + half)
    }

    fn clamp_translation(&self, translation: Vec2, scale: f32) -> Vec2 {
        let (min, max) = self.pan_bounds(scale);
        translation.clamp(min, max)
    }

    /// Apply one step of a pinch gesture: zoom first, then pan within the new bounds.
    pub fn apply_pinch(&mut self, delta: PinchDelta) {
        if !delta.scale_factor.is_finite() || delta.scale_factor <= 0.0 {
            return;
        }
        let scale = (self.scale * delta.scale_factor).clamp(self.min_scale(), self.max_scale);
        self.scale = scale;
        self.translation = self.clamp_translation(self.translation + delta.pan, scale);
    }

    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        (point - self.translation) / self.scale
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        self.translation + point * self.scale
    }
}

/// Inclusive range of field slots a viewport can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindow {
    pub start_col: i32,
    pub end_col: i32,
    pub start_row: i32,
    pub end_row: i32,
}

impl TileWindow {
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.start_col && col <= self.end_col && row >= self.start_row && row <= self.end_row
    }

    pub fn is_empty(&self) -> bool {
        self.start_col > self.end_col || self.start_row > self.end_row
    }
}

/// Field slots visible through `camera`, padded by `buffer_tiles` on every side and
/// clamped to a field spanning `-half_extent..half_extent` in both axes.
pub fn visible_tile_window(camera: &Camera2D, pitch: f32, buffer_tiles: i32, half_extent: i32) -> TileWindow {
    let top_left = camera.screen_to_world(Vec2::new(0.0, camera.viewport.top_inset));
    let bottom_right = camera.screen_to_world(Vec2::new(camera.viewport.width, camera.viewport.height));

    let start_col = (top_left.x / pitch).floor() as i32 - buffer_tiles;
    let end_col = (bottom_right.x / pitch).ceil() as i32 + buffer_tiles;
    let start_row = (top_left.y / pitch).floor() as i32 - buffer_tiles;
    let end_row = (bottom_right.y / pitch).ceil() as i32 + buffer_tiles;

    TileWindow {
        start_col: start_col.max(-half_extent),
        end_col: end_col.min(half_extent - 1),
        start_row: start_row.max(-half_extent),
        end_row: end_row.min(half_extent - 1),
    }
}

/// Map a screen point to a (row, col) cell of a grid drawn at `grid_origin` with
/// square cells of `cell_px`. Points left of or above the grid give negative values.
pub fn screen_to_grid_coordinates(point: Vec2, grid_origin: Vec2, cell_px: f32) -> (i64, i64) {
    let local = (point - grid_origin) / cell_px;
    (local.y.floor() as i64, local.x.floor() as i64)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any sequence of pinch steps keeps scale and translation inside their bounds.
        #[test]
        fn pinch_stays_in_bounds(steps in proptest::collection::vec((0.2f32..5.0, -800.0f32..800.0, -800.0f32..800.0), 1..30)) {
            let mut cam = Camera2D::new(Viewport::new(390.0, 844.0, 175.0), 5100.0);
            for (factor, dx, dy) in steps {
                cam.apply_pinch(PinchDelta { scale_factor: factor, pan: Vec2::new(dx, dy) });
                prop_assert!(cam.scale >= cam.min_scale() - 1e-6);
                prop_assert!(cam.scale <= cam.max_scale + 1e-6);
                let (min, max) = cam.pan_bounds(cam.scale);
                prop_assert!(cam.translation.x >= min.x - 1e-3 && cam.translation.x <= max.x + 1e-3);
                prop_assert!(cam.translation.y >= min.y - 1e-3 && cam.translation.y <= max.y + 1e-3);
            }
        }
    }
}
