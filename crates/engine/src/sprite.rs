use bytemuck::{Pod, Zeroable};

/// Per-instance tile data handed to the host renderer.
/// Layout: 8 floats = 32 bytes stride, readable straight out of wasm memory.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World-space position of the sprite's top-left corner.
    pub position: [f32; 2],
    /// World-space edge length (sprites are square).
    pub size: f32,
    /// Clockwise rotation in degrees (0, 90, 180, 270).
    pub rotation: f32,
    /// Texture index into the host's image list.
    pub texture: f32,
    /// Alpha / opacity (0.0 = invisible, 1.0 = opaque).
    pub alpha: f32,
    /// Which layer the sprite belongs to (see the `LAYER_*` constants).
    pub layer: f32,
    /// Host-side lookup key (tile serial), carried as f32.
    pub key: f32,
}

pub const LAYER_FIELD: f32 = 0.0;
pub const LAYER_GRID: f32 = 1.0;
pub const LAYER_DRAG: f32 = 2.0;

/// Number of f32 values per instance in the flat buffer.
pub const SPRITE_STRIDE: usize = std::mem::size_of::<SpriteInstance>() / std::mem::size_of::<f32>();

impl SpriteInstance {
    pub fn new(x: f32, y: f32, size: f32, texture: u32) -> Self {
        Self {
            position: [x, y],
            size,
            rotation: 0.0,
            texture: texture as f32,
            alpha: 1.0,
            layer: LAYER_FIELD,
            key: 0.0,
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_layer(mut self, layer: f32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_key(mut self, key: u64) -> Self {
        self.key = key as f32;
        self
    }
}

/// View a sprite list as the flat float buffer the host reads.
pub fn as_floats(sprites: &[SpriteInstance]) -> &[f32] {
    bytemuck::cast_slice(sprites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_eight_floats() {
        assert_eq!(SPRITE_STRIDE, 8);
    }

    #[test]
    fn flat_view_matches_fields() {
        let sprites = [
            SpriteInstance::new(1.0, 2.0, 50.0, 2).with_rotation(90.0).with_layer(LAYER_GRID).with_key(7),
        ];
        let floats = as_floats(&sprites);
        assert_eq!(floats, &[1.0, 2.0, 50.0, 90.0, 2.0, 1.0, LAYER_GRID, 7.0]);
    }
}
