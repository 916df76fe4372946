//! Enumeration of supercells for kernel dispatch.
//!
//! A mapper walks the supercells of an area in one or more passes. A
//! [`StrideMapper`] with stride `s` splits the area into `s^axes` passes: in
//! each pass only supercells whose coordinate satisfies `c % s == offset` on
//! every active axis are visited. With `s >= 3` no two supercells of one pass
//! are neighbours, so a kernel that touches a supercell and its 3^D
//! neighbourhood never races with another invocation of the same pass.

use haloframe_core::SupercellCoord;

use crate::area::AreaMask;
use crate::layout::GridLayout;
use crate::range::SupercellRange;

/// Pass-wise enumeration of supercells.
pub trait SupercellMapper {
    /// Stride between supercells of the same pass along each active axis.
    fn stride(&self) -> u32;

    /// Total number of passes.
    fn pass_count(&self) -> u32;

    /// Supercells of the current pass, in index order.
    fn current_pass(&self) -> Vec<SupercellCoord>;

    /// Advance to the next pass. Returns `false` once all passes are done.
    fn next(&mut self) -> bool;
}

/// Builds a mapper for a concrete grid.
pub trait MapperFactory {
    /// The mapper produced.
    type Mapper: SupercellMapper;

    /// Build a mapper positioned at the first pass.
    fn build(&self, layout: &GridLayout) -> Self::Mapper;
}

/// Strided walk over the supercells of an area.
#[derive(Clone, Debug)]
pub struct StrideMapper {
    layout: GridLayout,
    area: AreaMask,
    stride: u32,
    offset: [u32; 3],
}

impl StrideMapper {
    /// A mapper over `area` with the given stride.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is 0.
    pub fn new(layout: GridLayout, area: AreaMask, stride: u32) -> Self {
        assert!(stride > 0, "mapper stride must be positive");
        Self {
            layout,
            area,
            stride,
            offset: [0; 3],
        }
    }

    /// Offset of the current pass along each axis.
    pub fn offset(&self) -> [u32; 3] {
        self.offset
    }
}

impl SupercellMapper for StrideMapper {
    fn stride(&self) -> u32 {
        self.stride
    }

    fn pass_count(&self) -> u32 {
        self.stride.pow(self.layout.dim().axes() as u32)
    }

    fn current_pass(&self) -> Vec<SupercellCoord> {
        let extent = self.layout.extent();
        let whole = SupercellRange::new([0; 3], extent);
        whole
            .iter()
            .filter(|c| {
                (0..self.layout.dim().axes()).all(|a| c.0[a] % self.stride == self.offset[a])
            })
            .filter(|c| self.layout.in_area(*c, self.area))
            .collect()
    }

    fn next(&mut self) -> bool {
        for axis in 0..self.layout.dim().axes() {
            self.offset[axis] += 1;
            if self.offset[axis] < self.stride {
                return true;
            }
            self.offset[axis] = 0;
        }
        false
    }
}

/// Single-pass walk over every supercell of an area.
#[derive(Clone, Debug)]
pub struct AreaMapper {
    layout: GridLayout,
    area: AreaMask,
}

impl AreaMapper {
    /// A mapper over `area`.
    pub fn new(layout: GridLayout, area: AreaMask) -> Self {
        Self { layout, area }
    }
}

impl SupercellMapper for AreaMapper {
    fn stride(&self) -> u32 {
        1
    }

    fn pass_count(&self) -> u32 {
        1
    }

    fn current_pass(&self) -> Vec<SupercellCoord> {
        self.layout.supercells_in(self.area)
    }

    fn next(&mut self) -> bool {
        false
    }
}

/// Factory for [`StrideMapper`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrideAreaMapperFactory {
    /// Area to walk.
    pub area: AreaMask,
    /// Stride between supercells of one pass.
    pub stride: u32,
}

impl StrideAreaMapperFactory {
    /// Smallest stride that keeps neighbourhoods of one pass disjoint.
    pub const DEFAULT_STRIDE: u32 = 3;

    /// Factory over `area` with [`DEFAULT_STRIDE`](Self::DEFAULT_STRIDE).
    pub fn new(area: AreaMask) -> Self {
        Self {
            area,
            stride: Self::DEFAULT_STRIDE,
        }
    }

    /// Override the stride.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }
}

impl MapperFactory for StrideAreaMapperFactory {
    type Mapper = StrideMapper;

    fn build(&self, layout: &GridLayout) -> StrideMapper {
        StrideMapper::new(*layout, self.area, self.stride)
    }
}

/// Factory for [`AreaMapper`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AreaMapperFactory {
    /// Area to walk.
    pub area: AreaMask,
}

impl AreaMapperFactory {
    /// Factory over `area`.
    pub fn new(area: AreaMask) -> Self {
        Self { area }
    }
}

impl MapperFactory for AreaMapperFactory {
    type Mapper = AreaMapper;

    fn build(&self, layout: &GridLayout) -> AreaMapper {
        AreaMapper::new(*layout, self.area)
    }
}

/// Drain a mapper into its non-empty passes, in pass order.
pub fn collect_passes<M: SupercellMapper>(mut mapper: M) -> Vec<Vec<SupercellCoord>> {
    let mut passes = Vec::with_capacity(mapper.pass_count() as usize);
    loop {
        let pass = mapper.current_pass();
        if !pass.is_empty() {
            passes.push(pass);
        }
        if !mapper.next() {
            break;
        }
    }
    passes
}

/// First pair of supercells of one pass that are fewer than `min_distance`
/// apart on every axis, with the index of their pass.
///
/// Quadratic in the pass size.
pub fn find_close_pair(
    passes: &[Vec<SupercellCoord>],
    min_distance: u32,
) -> Option<(usize, SupercellCoord, SupercellCoord)> {
    for (p, pass) in passes.iter().enumerate() {
        for (i, a) in pass.iter().enumerate() {
            for b in &pass[i + 1..] {
                let chebyshev = (0..3)
                    .map(|ax| a.0[ax].abs_diff(b.0[ax]))
                    .max()
                    .unwrap_or(0);
                if chebyshev < min_distance {
                    return Some((p, *a, *b));
                }
            }
        }
    }
    None
}
