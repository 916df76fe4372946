//! Axis-aligned boxes of supercells.

use haloframe_core::SupercellCoord;

/// A half-open box `[lo, hi)` of supercell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupercellRange {
    /// Inclusive lower corner.
    pub lo: [u32; 3],
    /// Exclusive upper corner.
    pub hi: [u32; 3],
}

impl SupercellRange {
    /// Construct from corners.
    pub fn new(lo: [u32; 3], hi: [u32; 3]) -> Self {
        Self { lo, hi }
    }

    /// Extent along each axis.
    pub fn extent(&self) -> [u32; 3] {
        [
            self.hi[0].saturating_sub(self.lo[0]),
            self.hi[1].saturating_sub(self.lo[1]),
            self.hi[2].saturating_sub(self.lo[2]),
        ]
    }

    /// Number of supercells in the box.
    pub fn len(&self) -> usize {
        self.extent().iter().map(|&e| e as usize).product()
    }

    /// Whether the box is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `coord` lies inside the box.
    pub fn contains(&self, coord: SupercellCoord) -> bool {
        (0..3).all(|a| coord.0[a] >= self.lo[a] && coord.0[a] < self.hi[a])
    }

    /// Coordinate relative to `lo`. `None` if outside the box.
    pub fn relative(&self, coord: SupercellCoord) -> Option<[u32; 3]> {
        if !self.contains(coord) {
            return None;
        }
        Some([
            coord.0[0] - self.lo[0],
            coord.0[1] - self.lo[1],
            coord.0[2] - self.lo[2],
        ])
    }

    /// Absolute coordinate of a relative one. `None` if outside the box.
    pub fn absolute(&self, relative: [u32; 3]) -> Option<SupercellCoord> {
        let mut out = [0u32; 3];
        for axis in 0..3 {
            let c = self.lo[axis].checked_add(relative[axis])?;
            if c >= self.hi[axis] {
                return None;
            }
            out[axis] = c;
        }
        Some(SupercellCoord(out))
    }

    /// Iterate all coordinates, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = SupercellCoord> + '_ {
        let [lx, ly, lz] = self.lo;
        let [hx, hy, hz] = self.hi;
        (lz..hz).flat_map(move |z| {
            (ly..hy).flat_map(move |y| (lx..hx).map(move |x| SupercellCoord::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_and_absolute_invert() {
        let r = SupercellRange::new([2, 0, 0], [4, 3, 1]);
        let c = SupercellCoord::new(3, 2, 0);
        let rel = r.relative(c).unwrap();
        assert_eq!(rel, [1, 2, 0]);
        assert_eq!(r.absolute(rel), Some(c));
        assert_eq!(r.absolute([2, 0, 0]), None);
    }

    #[test]
    fn iter_visits_len_coords_x_fastest() {
        let r = SupercellRange::new([0, 0, 0], [2, 2, 1]);
        let all: Vec<_> = r.iter().collect();
        assert_eq!(all.len(), r.len());
        assert_eq!(all[0], SupercellCoord::new(0, 0, 0));
        assert_eq!(all[1], SupercellCoord::new(1, 0, 0));
        assert_eq!(all[2], SupercellCoord::new(0, 1, 0));
    }

    #[test]
    fn inverted_box_is_empty() {
        let r = SupercellRange::new([3, 0, 0], [2, 1, 1]);
        assert!(r.is_empty());
        assert_eq!(r.iter().count(), 0);
    }
}
