use std::collections::HashMap;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("raster layout has no cells ({cols}x{rows})")]
    EmptyLayout { cols: u32, rows: u32 },
    #[error("cell ({row}, {col}) is outside the {cols}x{rows} layout")]
    CellOutOfBounds { row: u32, col: u32, cols: u32, rows: u32 },
    #[error("no texture loaded for index {0}")]
    MissingTexture(usize),
    #[error("image encode failed: {0}")]
    Encode(String),
}

/// Geometry and colors of an exported grid picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    pub cols: u32,
    pub rows: u32,
    pub cell_px: u32,
    pub background: Rgb<u8>,
    pub border: Rgb<u8>,
}

impl RasterLayout {
    pub const DEFAULT_CELL_PX: u32 = 50;

    /// Black canvas with white 1px cell borders.
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            cell_px: Self::DEFAULT_CELL_PX,
            background: Rgb([0, 0, 0]),
            border: Rgb([255, 255, 255]),
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.cols * self.cell_px, self.rows * self.cell_px)
    }
}

/// One occupied cell: which texture to draw and how many clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterCell {
    pub row: u32,
    pub col: u32,
    pub texture: usize,
    pub quarter_turns: u8,
}

/// Paint `cells` onto a fresh canvas. Empty cells show the background.
pub fn compose(layout: &RasterLayout, cells: &[RasterCell], textures: &[RgbaImage]) -> Result<RgbImage, RasterError> {
    if layout.cols == 0 || layout.rows == 0 || layout.cell_px == 0 {
        log::error!("raster: empty {}x{} layout", layout.cols, layout.rows);
        return Err(RasterError::EmptyLayout {
            cols: layout.cols,
            rows: layout.rows,
        });
    }

    let (width, height) = layout.pixel_size();
    let mut canvas = RgbImage::from_pixel(width, height, layout.background);
    // Scaled + rotated textures, keyed by (texture, quarter turns)
    let mut prepared: HashMap<(usize, u8), RgbaImage> = HashMap::new();

    for cell in cells {
        if cell.row >= layout.rows || cell.col >= layout.cols {
            log::error!("raster: cell ({}, {}) outside {}x{}", cell.row, cell.col, layout.cols, layout.rows);
            return Err(RasterError::CellOutOfBounds {
                row: cell.row,
                col: cell.col,
                cols: layout.cols,
                rows: layout.rows,
            });
        }
        let turns = cell.quarter_turns % 4;
        let key = (cell.texture, turns);
        if !prepared.contains_key(&key) {
            let Some(source) = textures.get(cell.texture) else {
                log::error!("raster: texture {} not loaded ({} available)", cell.texture, textures.len());
                return Err(RasterError::MissingTexture(cell.texture));
            };
            prepared.insert(key, prepare_texture(source, layout.cell_px, turns));
        }
        if let Some(tile) = prepared.get(&key) {
            blend_onto(&mut canvas, tile, cell.col * layout.cell_px, cell.row * layout.cell_px);
        }
    }

    for row in 0..layout.rows {
        for col in 0..layout.cols {
            stroke_cell(&mut canvas, col * layout.cell_px, row * layout.cell_px, layout.cell_px, layout.border);
        }
    }

    Ok(canvas)
}

/// JPEG-encode a composed canvas. `quality` is 1..=100.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
        encoder
            .encode(image.as_raw(), image.width(), image.height(), image::ColorType::Rgb8)
            .map_err(|e| {
                log::error!("raster: jpeg encode failed: {}", e);
                RasterError::Encode(e.to_string())
            })?;
    }
    Ok(buffer)
}

fn prepare_texture(source: &RgbaImage, cell_px: u32, quarter_turns: u8) -> RgbaImage {
    let scaled = if source.dimensions() == (cell_px, cell_px) {
        source.clone()
    } else {
        imageops::resize(source, cell_px, cell_px, FilterType::Triangle)
    };
    match quarter_turns {
        1 => imageops::rotate90(&scaled),
        2 => imageops::rotate180(&scaled),
        3 => imageops::rotate270(&scaled),
        _ => scaled,
    }
}

/// Source-over blend of an RGBA tile onto the RGB canvas at (x0, y0).
fn blend_onto(canvas: &mut RgbImage, tile: &RgbaImage, x0: u32, y0: u32) {
    for (x, y, px) in tile.enumerate_pixels() {
        let (cx, cy) = (x0 + x, y0 + y);
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }
        let [r, g, b, a] = px.0;
        let dst = canvas.get_pixel_mut(cx, cy);
        let alpha = a as u32;
        for (d, s) in dst.0.iter_mut().zip([r, g, b]) {
            *d = ((s as u32 * alpha + *d as u32 * (255 - alpha)) / 255) as u8;
        }
    }
}

fn stroke_cell(canvas: &mut RgbImage, x0: u32, y0: u32, size: u32, color: Rgb<u8>) {
    let last = size - 1;
    for i in 0..size {
        canvas.put_pixel(x0 + i, y0, color);
        canvas.put_pixel(x0 + i, y0 + last, color);
        canvas.put_pixel(x0, y0 + i, color);
        canvas.put_pixel(x0 + last, y0 + i, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 2x2 texture: red top-left, everything else green.
    fn marker_texture() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img
    }

    fn small_layout(cols: u32, rows: u32) -> RasterLayout {
        RasterLayout {
            cell_px: 10,
            ..RasterLayout::new(cols, rows)
        }
    }

    #[test]
    fn canvas_size_follows_grid() {
        let layout = RasterLayout::new(3, 2);
        let img = compose(&layout, &[], &[]).unwrap();
        assert_eq!(img.dimensions(), (150, 100));
    }

    #[test]
    fn empty_cells_are_black_with_white_border() {
        let layout = small_layout(2, 1);
        let img = compose(&layout, &[], &[]).unwrap();
        assert_eq!(*img.get_pixel(5, 5), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(9, 5), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(10, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn rotation_moves_marker_clockwise() {
        let layout = small_layout(1, 1);
        let textures = vec![marker_texture()];
        let upright = compose(&layout, &[RasterCell { row: 0, col: 0, texture: 0, quarter_turns: 0 }], &textures).unwrap();
        let turned = compose(&layout, &[RasterCell { row: 0, col: 0, texture: 0, quarter_turns: 1 }], &textures).unwrap();
        // Marker starts top-left; a clockwise quarter turn moves it top-right.
        assert_eq!(*upright.get_pixel(1, 1), Rgb([255, 0, 0]));
        assert_eq!(*turned.get_pixel(8, 1), Rgb([255, 0, 0]));
        assert_eq!(*turned.get_pixel(1, 1), Rgb([0, 255, 0]));
    }

    #[test]
    fn missing_texture_is_an_error() {
        let layout = small_layout(1, 1);
        let err = compose(&layout, &[RasterCell { row: 0, col: 0, texture: 2, quarter_turns: 0 }], &[]).unwrap_err();
        assert!(matches!(err, RasterError::MissingTexture(2)));
    }

    #[test]
    fn out_of_bounds_cell_is_an_error() {
        let layout = small_layout(1, 1);
        let err = compose(&layout, &[RasterCell { row: 1, col: 0, texture: 0, quarter_turns: 0 }], &[marker_texture()]).unwrap_err();
        assert!(matches!(err, RasterError::CellOutOfBounds { row: 1, .. }));
    }

    #[test]
    fn zero_sized_layout_rejected() {
        assert!(matches!(
            compose(&RasterLayout::new(0, 3), &[], &[]),
            Err(RasterError::EmptyLayout { cols: 0, rows: 3 })
        ));
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions() {
        let layout = RasterLayout::new(2, 3);
        let img = compose(&layout, &[], &[]).unwrap();
        let bytes = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 150));
    }
}
