//! CORE / BORDER / GUARD classification.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// The area a single supercell belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Area {
    /// Interior: no neighbour partition is affected by its particles.
    Core,
    /// Owned supercells adjacent to the guard; their state is mirrored by
    /// neighbouring partitions' guards.
    Border,
    /// Halo owned conceptually by neighbouring partitions.
    Guard,
}

impl Area {
    /// The single-area mask.
    pub fn mask(self) -> AreaMask {
        match self {
            Self::Core => AreaMask::CORE,
            Self::Border => AreaMask::BORDER,
            Self::Guard => AreaMask::GUARD,
        }
    }
}

/// Union of areas, e.g. `AreaMask::CORE | AreaMask::BORDER`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AreaMask(u8);

impl AreaMask {
    /// No area.
    pub const NONE: Self = Self(0);
    /// Interior supercells.
    pub const CORE: Self = Self(1);
    /// Border supercells.
    pub const BORDER: Self = Self(2);
    /// Guard supercells.
    pub const GUARD: Self = Self(4);
    /// CORE + BORDER + GUARD.
    pub const ALL: Self = Self(7);

    /// Whether `area` is part of the mask.
    pub fn contains(self, area: Area) -> bool {
        self.0 & area.mask().0 != 0
    }

    /// Whether the mask selects nothing.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for AreaMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AreaMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<Area> for AreaMask {
    fn from(area: Area) -> Self {
        area.mask()
    }
}

impl fmt::Display for AreaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names = [
            (Area::Core, "CORE"),
            (Area::Border, "BORDER"),
            (Area::Guard, "GUARD"),
        ];
        let mut first = true;
        for (area, name) in names {
            if self.contains(area) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
