use serde::{Deserialize, Serialize};

use crate::components::{ComposerConfig, OrderType, PriceTable, Variant};
use crate::grid::{CompositionGrid, VariantCounts};

/// Physical size of the finished composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_cm: u32,
    pub height_cm: u32,
}

impl Dimensions {
    pub fn label(&self) -> String {
        format!("{} x {} cm", self.width_cm, self.height_cm)
    }
}

/// Everything the order dialog shows. Always derived from the grid, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub counts: VariantCounts,
    pub line_totals: [u32; Variant::COUNT],
    pub subtotal: u32,
    pub surcharge: u32,
    pub total: u32,
    pub dimensions: Dimensions,
}

impl OrderSummary {
    pub fn tile_count(&self) -> u32 {
        self.counts.total()
    }

    pub fn line_total(&self, variant: Variant) -> u32 {
        self.line_totals[variant.index()]
    }
}

/// Price a set of variant counts. Amounts saturate at `u32::MAX` instead of wrapping.
pub fn summarize_counts(
    counts: VariantCounts,
    prices: &PriceTable,
    surcharge_per_tile: u32,
    apply_surcharge: bool,
    dimensions: Dimensions,
) -> OrderSummary {
    let mut line_totals = [0u32; Variant::COUNT];
    for variant in Variant::ALL {
        line_totals[variant.index()] = counts.get(variant).saturating_mul(prices.price(variant));
    }
    let subtotal = line_totals.iter().fold(0u32, |acc, &t| acc.saturating_add(t));
    let surcharge = if apply_surcharge {
        counts.total().saturating_mul(surcharge_per_tile)
    } else {
        0
    };
    OrderSummary {
        counts,
        line_totals,
        subtotal,
        surcharge,
        total: subtotal.saturating_add(surcharge),
        dimensions,
    }
}

/// Price the current composition.
pub fn summarize(grid: &CompositionGrid, config: &ComposerConfig, order_type: OrderType) -> OrderSummary {
    let dimensions = Dimensions {
        width_cm: (grid.width() as u32).saturating_mul(config.unit_size_cm),
        height_cm: (grid.height() as u32).saturating_mul(config.unit_size_cm),
    };
    summarize_counts(
        grid.variant_counts(),
        &config.prices,
        config.magnetic_surcharge,
        order_type == OrderType::Magnetic,
        dimensions,
    )
}

/// Whole euros with two decimals, e.g. `62.00`.
pub fn format_amount(euros: u32) -> String {
    format!("{}.00", euros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Rotation;
    use crate::grid::TileFace;

    fn grid_with(counts: [usize; 3], width: usize, height: usize) -> CompositionGrid {
        let mut grid = CompositionGrid::new(width, height).unwrap();
        for variant in Variant::ALL {
            for _ in 0..counts[variant.index()] {
                grid.place_first_empty(TileFace::new(variant, Rotation::Deg0)).unwrap();
            }
        }
        grid
    }

    #[test]
    fn extreme_config_saturates() {
        let config = ComposerConfig {
            prices: PriceTable { prices: [u32::MAX, u32::MAX, 1] },
            magnetic_surcharge: u32::MAX,
            unit_size_cm: u32::MAX,
            ..ComposerConfig::default()
        };
        let grid = grid_with([2, 3, 1], 3, 2);
        let summary = summarize(&grid, &config, OrderType::Magnetic);
        assert_eq!(summary.line_totals, [u32::MAX, u32::MAX, 1]);
        assert_eq!(summary.subtotal, u32::MAX);
        assert_eq!(summary.surcharge, u32::MAX);
        assert_eq!(summary.total, u32::MAX);
        assert_eq!(summary.dimensions.width_cm, u32::MAX);
    }

    #[test]
    fn regular_order_has_no_surcharge() {
        let grid = grid_with([2, 3, 1], 3, 2);
        let summary = summarize(&grid, &ComposerConfig::default(), OrderType::Regular);
        assert_eq!(summary.line_totals, [14, 36, 12]);
        assert_eq!(summary.subtotal, 62);
        assert_eq!(summary.surcharge, 0);
        assert_eq!(summary.total, 62);
    }

    #[test]
    fn magnetic_order_adds_per_tile_surcharge() {
        let grid = grid_with([2, 3, 1], 3, 2);
        let summary = summarize(&grid, &ComposerConfig::default(), OrderType::Magnetic);
        assert_eq!(summary.surcharge, 18);
        assert_eq!(summary.total, 80);
        assert_eq!(summary.tile_count(), 6);
    }

    #[test]
    fn empty_cells_are_not_priced() {
        let grid = grid_with([1, 0, 0], 4, 4);
        let summary = summarize(&grid, &ComposerConfig::default(), OrderType::Magnetic);
        assert_eq!(summary.total, 7 + 3);
    }

    #[test]
    fn dimensions_use_unit_size() {
        let grid = grid_with([0, 0, 0], 3, 2);
        let summary = summarize(&grid, &ComposerConfig::default(), OrderType::Regular);
        assert_eq!(summary.dimensions.label(), "45 x 30 cm");
    }

    #[test]
    fn amount_has_two_decimals() {
        assert_eq!(format_amount(62), "62.00");
        assert_eq!(format_amount(0), "0.00");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// total = sum(count * price) + surcharge, and the surcharge only applies when asked.
        #[test]
        fn total_is_linear_in_counts(c0 in 0u32..200, c1 in 0u32..200, c2 in 0u32..200, magnetic in any::<bool>()) {
            let counts = VariantCounts([c0, c1, c2]);
            let dims = Dimensions { width_cm: 15, height_cm: 15 };
            let s = summarize_counts(counts, &PriceTable::default(), 3, magnetic, dims);
            let expected = c0 * 7 + (c1 + c2) * 12 + if magnetic { (c0 + c1 + c2) * 3 } else { 0 };
            prop_assert_eq!(s.total, expected);
            prop_assert_eq!(s.subtotal + s.surcharge, s.total);
        }
    }
}
