//! Validated grid geometry and index arithmetic.

use haloframe_core::{Dimensionality, ExchangeType, SupercellCoord};

use crate::area::{Area, AreaMask};
use crate::config::GridConfig;
use crate::error::GridError;
use crate::range::SupercellRange;

/// Immutable geometry of a partition's supercell grid, guard included.
///
/// Supercell indices are dense in `0..supercell_count()` with x varying
/// fastest: `index = x + nx * (y + ny * z)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    dim: Dimensionality,
    supercell_size: [u32; 3],
    local: [u32; 3],
    guard: [u32; 3],
    extent: [u32; 3],
    tile_volume: u32,
    count: u32,
}

impl GridLayout {
    /// Validate `config` and derive the layout.
    pub fn new(config: &GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        let mut guard = [0u32; 3];
        let mut extent = [0u32; 3];
        for axis in 0..3 {
            if config.dim.is_active(axis) {
                guard[axis] = config.guard_supercells;
            }
            // validate() already proved these fit.
            extent[axis] = config.local_supercells[axis] + 2 * guard[axis];
        }
        Ok(Self {
            dim: config.dim,
            supercell_size: config.supercell_size,
            local: config.local_supercells,
            guard,
            extent,
            tile_volume: config.supercell_size.iter().product(),
            count: extent.iter().product(),
        })
    }

    /// Dimensionality of the grid.
    pub fn dim(&self) -> Dimensionality {
        self.dim
    }

    /// Cells per supercell along each axis.
    pub fn supercell_size(&self) -> [u32; 3] {
        self.supercell_size
    }

    /// Cells per supercell; equals the frame capacity.
    pub fn tile_volume(&self) -> u32 {
        self.tile_volume
    }

    /// Supercells along each axis, guard included.
    pub fn extent(&self) -> [u32; 3] {
        self.extent
    }

    /// Owned (CORE + BORDER) supercells along each axis.
    pub fn local_extent(&self) -> [u32; 3] {
        self.local
    }

    /// Guard width per axis (0 on inactive axes).
    pub fn guard_width(&self) -> [u32; 3] {
        self.guard
    }

    /// Total supercells, guard included.
    pub fn supercell_count(&self) -> usize {
        self.count as usize
    }

    /// Whether `coord` is inside the grid.
    pub fn contains(&self, coord: SupercellCoord) -> bool {
        (0..3).all(|a| coord.0[a] < self.extent[a])
    }

    /// Dense index of `coord`.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the grid.
    pub fn index(&self, coord: SupercellCoord) -> usize {
        assert!(
            self.contains(coord),
            "supercell {coord} outside grid {:?}",
            self.extent
        );
        let [x, y, z] = coord.0;
        let [nx, ny, _] = self.extent;
        x as usize + nx as usize * (y as usize + ny as usize * z as usize)
    }

    /// Inverse of [`index`](Self::index).
    ///
    /// # Panics
    ///
    /// Panics if `index >= supercell_count()`.
    pub fn coord(&self, index: usize) -> SupercellCoord {
        assert!(
            index < self.supercell_count(),
            "supercell index {index} out of range {}",
            self.count
        );
        let nx = self.extent[0] as usize;
        let ny = self.extent[1] as usize;
        let x = index % nx;
        let y = (index / nx) % ny;
        let z = index / (nx * ny);
        SupercellCoord::new(x as u32, y as u32, z as u32)
    }

    /// `coord + delta`, or `None` if that leaves the grid.
    pub fn checked_offset(&self, coord: SupercellCoord, delta: [i32; 3]) -> Option<SupercellCoord> {
        coord.offset(delta).filter(|c| self.contains(*c))
    }

    /// Classify a supercell.
    pub fn area_of(&self, coord: SupercellCoord) -> Area {
        let mut border = false;
        for axis in 0..3 {
            let g = self.guard[axis];
            if g == 0 {
                continue;
            }
            let n = self.extent[axis];
            let c = coord.0[axis];
            if c < g || c >= n - g {
                return Area::Guard;
            }
            if c < 2 * g || c >= n - 2 * g {
                border = true;
            }
        }
        if border {
            Area::Border
        } else {
            Area::Core
        }
    }

    /// Whether `coord` belongs to any area of `mask`.
    pub fn in_area(&self, coord: SupercellCoord, mask: AreaMask) -> bool {
        mask.contains(self.area_of(coord))
    }

    /// The owned (CORE + BORDER) box.
    pub fn local_range(&self) -> SupercellRange {
        let mut lo = [0u32; 3];
        let mut hi = [0u32; 3];
        for axis in 0..3 {
            lo[axis] = self.guard[axis];
            hi[axis] = self.extent[axis] - self.guard[axis];
        }
        SupercellRange::new(lo, hi)
    }

    /// Guard supercells that belong to exchange direction `ex`.
    ///
    /// Along each axis: offset +1 selects the upper guard layer, -1 the lower
    /// one, 0 the owned span between them.
    ///
    /// # Panics
    ///
    /// Panics if `ex` is not valid for this grid's dimensionality.
    pub fn guard_range(&self, ex: ExchangeType) -> SupercellRange {
        self.directional_range(ex, |n, g, o| match o {
            1 => (n - g, n),
            -1 => (0, g),
            _ => (g, n - g),
        })
    }

    /// Border supercells whose particles mirror into the neighbour's guard
    /// in direction `ex`. Same shape as [`guard_range`](Self::guard_range),
    /// shifted one guard width inward.
    ///
    /// # Panics
    ///
    /// Panics if `ex` is not valid for this grid's dimensionality.
    pub fn border_range(&self, ex: ExchangeType) -> SupercellRange {
        self.directional_range(ex, |n, g, o| match o {
            1 => (n - 2 * g, n - g),
            -1 => (g, 2 * g),
            _ => (g, n - g),
        })
    }

    fn directional_range(
        &self,
        ex: ExchangeType,
        span: impl Fn(u32, u32, i32) -> (u32, u32),
    ) -> SupercellRange {
        assert!(
            ex.is_valid_for(self.dim),
            "exchange {ex} invalid for {:?} grid",
            self.dim
        );
        let offset = ex.offset();
        let mut lo = [0u32; 3];
        let mut hi = [0u32; 3];
        for axis in 0..3 {
            let (l, h) = span(self.extent[axis], self.guard[axis], offset[axis]);
            lo[axis] = l;
            hi[axis] = h;
        }
        SupercellRange::new(lo, hi)
    }

    /// All supercells whose area is in `mask`, in index order.
    pub fn supercells_in(&self, mask: AreaMask) -> Vec<SupercellCoord> {
        SupercellRange::new([0; 3], self.extent)
            .iter()
            .filter(|c| self.in_area(*c, mask))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout_2d(local: [u32; 2], guard: u32) -> GridLayout {
        GridLayout::new(&GridConfig::new_2d([4, 4], local).with_guard(guard)).unwrap()
    }

    #[test]
    fn extent_adds_guard_on_active_axes_only() {
        let l = layout_2d([4, 6], 1);
        assert_eq!(l.extent(), [6, 8, 1]);
        assert_eq!(l.supercell_count(), 48);
        assert_eq!(l.tile_volume(), 16);
        assert_eq!(l.guard_width(), [1, 1, 0]);
    }

    #[test]
    fn classification_2d() {
        let l = layout_2d([4, 4], 1);
        assert_eq!(l.area_of(SupercellCoord::new(0, 3, 0)), Area::Guard);
        assert_eq!(l.area_of(SupercellCoord::new(5, 3, 0)), Area::Guard);
        assert_eq!(l.area_of(SupercellCoord::new(1, 3, 0)), Area::Border);
        assert_eq!(l.area_of(SupercellCoord::new(3, 4, 0)), Area::Border);
        assert_eq!(l.area_of(SupercellCoord::new(2, 3, 0)), Area::Core);
        assert_eq!(l.supercells_in(AreaMask::CORE).len(), 4);
        assert_eq!(l.supercells_in(AreaMask::BORDER).len(), 12);
        assert_eq!(l.supercells_in(AreaMask::GUARD).len(), 20);
    }

    #[test]
    fn guard_and_border_ranges_2d() {
        let l = layout_2d([4, 4], 1);
        let right = l.guard_range(ExchangeType::RIGHT);
        assert_eq!(right, SupercellRange::new([5, 1, 0], [6, 5, 1]));
        let left_border = l.border_range(ExchangeType::LEFT);
        assert_eq!(left_border, SupercellRange::new([1, 1, 0], [2, 5, 1]));
        let corner = l.guard_range(ExchangeType::from_offset([1, -1, 0]).unwrap());
        assert_eq!(corner, SupercellRange::new([5, 0, 0], [6, 1, 1]));
    }

    #[test]
    fn guard_ranges_partition_the_guard() {
        let l = GridLayout::new(&GridConfig::new_3d([2, 2, 2], [3, 4, 2])).unwrap();
        let mut seen = vec![0u32; l.supercell_count()];
        for ex in ExchangeType::all(l.dim()) {
            for c in l.guard_range(ex).iter() {
                assert_eq!(l.area_of(c), Area::Guard, "{c} in guard of {ex}");
                seen[l.index(c)] += 1;
            }
        }
        for c in l.supercells_in(AreaMask::GUARD) {
            assert_eq!(seen[l.index(c)], 1, "{c}");
        }
    }

    #[test]
    fn border_range_is_mirror_of_guard_shifted_inward() {
        let l = layout_2d([5, 4], 2);
        for ex in ExchangeType::all(l.dim()) {
            let b = l.border_range(ex);
            let g = l.guard_range(ex);
            assert_eq!(b.extent(), g.extent(), "{ex}");
            for c in b.iter() {
                assert_ne!(l.area_of(c), Area::Guard);
            }
        }
    }

    #[test]
    fn checked_offset_stays_in_grid() {
        let l = layout_2d([2, 2], 1);
        assert_eq!(l.checked_offset(SupercellCoord::new(0, 0, 0), [-1, 0, 0]), None);
        assert_eq!(l.checked_offset(SupercellCoord::new(3, 0, 0), [1, 0, 0]), None);
        assert_eq!(
            l.checked_offset(SupercellCoord::new(1, 1, 0), [1, 1, 0]),
            Some(SupercellCoord::new(2, 2, 0))
        );
    }

    #[test]
    #[should_panic(expected = "outside grid")]
    fn index_outside_grid_panics() {
        layout_2d([2, 2], 1).index(SupercellCoord::new(4, 0, 0));
    }

    proptest! {
        #[test]
        fn index_coord_roundtrip(
            nx in 2u32..6, ny in 2u32..6, nz in 2u32..6, seed in 0usize..10_000
        ) {
            let l = GridLayout::new(&GridConfig::new_3d([1, 1, 1], [nx, ny, nz])).unwrap();
            let i = seed % l.supercell_count();
            prop_assert_eq!(l.index(l.coord(i)), i);
        }
    }
}
