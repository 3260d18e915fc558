use image::RgbaImage;
use tessera_engine::raster::{self, RasterCell, RasterError, RasterLayout};

use crate::grid::CompositionGrid;

/// Highest encoder quality, matching a `toDataURL('image/jpeg', 1.0)` export.
pub const EXPORT_JPEG_QUALITY: u8 = 100;

/// Occupied cells of `grid` as raster cells. Textures are indexed by variant.
pub fn raster_cells(grid: &CompositionGrid) -> Vec<RasterCell> {
    grid.occupied()
        .map(|(row, col, tile)| RasterCell {
            row: row as u32,
            col: col as u32,
            texture: tile.variant.index(),
            quarter_turns: tile.rotation.quarter_turns(),
        })
        .collect()
}

/// Render the composition and encode it as JPEG.
/// `textures` holds one decoded image per variant, in variant order.
pub fn export_jpeg(grid: &CompositionGrid, textures: &[RgbaImage]) -> Result<Vec<u8>, RasterError> {
    let layout = RasterLayout::new(grid.width() as u32, grid.height() as u32);
    let cells = raster_cells(grid);
    let image = raster::compose(&layout, &cells, textures)?;
    let bytes = raster::encode_jpeg(&image, EXPORT_JPEG_QUALITY)?;
    log::info!(
        "export: {}x{} composition, {} tiles, {} bytes",
        grid.width(),
        grid.height(),
        cells.len(),
        bytes.len()
    );
    Ok(bytes)
}

pub fn export_file_name(title: &str) -> String {
    format!("{}.jpg", title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Rotation, Variant};
    use crate::grid::TileFace;
    use image::Rgba;

    fn textures() -> Vec<RgbaImage> {
        vec![
            RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])),
            RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255])),
            RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255])),
        ]
    }

    #[test]
    fn cells_follow_variant_and_rotation() {
        let mut grid = CompositionGrid::new(2, 2).unwrap();
        grid.place_tile(1, 0, TileFace::new(Variant::S2, Rotation::Deg270));
        let cells = raster_cells(&grid);
        assert_eq!(
            cells,
            vec![RasterCell { row: 1, col: 0, texture: 2, quarter_turns: 3 }]
        );
    }

    #[test]
    fn jpeg_has_grid_pixel_size() {
        let mut grid = CompositionGrid::new(3, 2).unwrap();
        grid.place_first_empty(TileFace::new(Variant::S1, Rotation::Deg90));
        let bytes = export_jpeg(&grid, &textures()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 100));
        // center of the first cell is green, an empty cell stays dark
        let px = decoded.to_rgb8();
        assert!(px.get_pixel(25, 25)[1] > 200);
        assert!(px.get_pixel(125, 75)[1] < 60);
    }

    #[test]
    fn exports_at_full_quality() {
        assert_eq!(EXPORT_JPEG_QUALITY, 100);
        let mut grid = CompositionGrid::new(1, 1).unwrap();
        grid.place_first_empty(TileFace::new(Variant::S0, Rotation::Deg0));
        let full = export_jpeg(&grid, &textures()).unwrap();
        let image = raster::compose(&RasterLayout::new(1, 1), &raster_cells(&grid), &textures()).unwrap();
        let lower = raster::encode_jpeg(&image, 90).unwrap();
        assert!(full.len() > lower.len());
    }

    #[test]
    fn missing_texture_is_an_error() {
        let mut grid = CompositionGrid::new(1, 1).unwrap();
        grid.place_first_empty(TileFace::new(Variant::S2, Rotation::Deg0));
        let only_one = vec![textures().remove(0)];
        assert!(matches!(export_jpeg(&grid, &only_one), Err(RasterError::MissingTexture(2))));
    }

    #[test]
    fn file_name_appends_extension() {
        assert_eq!(export_file_name("Kompozicija S01 S10 S20 01 01 2025"), "Kompozicija S01 S10 S20 01 01 2025.jpg");
    }
}
