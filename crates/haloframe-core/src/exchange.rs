//! Neighbour-direction encoding for guard exchange.
//!
//! A direction is encoded as one base-3 digit per axis:
//!
//! ```text
//! x: 0 = none, RIGHT  = 1 (+x), LEFT  = 2 (-x)
//! y: 0 = none, BOTTOM = 3 (+y), TOP   = 6 (-y)
//! z: 0 = none, BACK   = 9 (+z), FRONT = 18 (-z)
//! ```
//!
//! The code of a diagonal direction is the sum of its axis codes, e.g.
//! `RIGHT + TOP = 7`. Code 0 means "no direction" and is never a valid
//! exchange. A 2D partition uses codes `1..9`, a 3D partition `1..27`.

use std::fmt;

use smallvec::SmallVec;

use crate::dim::Dimensionality;

/// One neighbour direction of a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeType(u32);

impl ExchangeType {
    /// +x.
    pub const RIGHT: Self = Self(1);
    /// -x.
    pub const LEFT: Self = Self(2);
    /// +y.
    pub const BOTTOM: Self = Self(3);
    /// -y.
    pub const TOP: Self = Self(6);
    /// +z.
    pub const BACK: Self = Self(9);
    /// -z.
    pub const FRONT: Self = Self(18);

    /// Validate an integer direction code for the given dimensionality.
    ///
    /// Returns `None` for code 0 and for codes outside `1..3^axes`.
    pub fn new(code: u32, dim: Dimensionality) -> Option<Self> {
        if code == 0 || code >= dim.exchange_count() {
            return None;
        }
        Some(Self(code))
    }

    /// Build the direction pointing along a per-axis offset in `{-1, 0, 1}`.
    ///
    /// Returns `None` for the zero offset.
    ///
    /// # Panics
    ///
    /// Panics if a component is outside `{-1, 0, 1}`.
    pub fn from_offset(offset: [i32; 3]) -> Option<Self> {
        let mut code = 0;
        let mut weight = 1;
        for o in offset {
            let digit = match o {
                0 => 0,
                1 => 1,
                -1 => 2,
                other => panic!("exchange offset component must be -1, 0 or 1, got {other}"),
            };
            code += digit * weight;
            weight *= 3;
        }
        if code == 0 {
            None
        } else {
            Some(Self(code))
        }
    }

    /// The raw integer code.
    pub fn code(self) -> u32 {
        self.0
    }

    /// Per-axis offset in `{-1, 0, 1}` this direction points along.
    pub fn offset(self) -> [i32; 3] {
        let mut out = [0i32; 3];
        let mut rest = self.0;
        for slot in &mut out {
            *slot = match rest % 3 {
                0 => 0,
                1 => 1,
                _ => -1,
            };
            rest /= 3;
        }
        out
    }

    /// The opposite direction.
    pub fn mirror(self) -> Self {
        let [x, y, z] = self.offset();
        // Non-zero by construction.
        Self::from_offset([-x, -y, -z]).unwrap_or(self)
    }

    /// Whether the direction is representable in `dim`.
    pub fn is_valid_for(self, dim: Dimensionality) -> bool {
        Self::new(self.0, dim).is_some()
    }

    /// All directions of a partition of the given dimensionality, in code order.
    pub fn all(dim: Dimensionality) -> SmallVec<[Self; 26]> {
        (1..dim.exchange_count()).map(Self).collect()
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [[&str; 3]; 3] = [
            ["", "RIGHT", "LEFT"],
            ["", "BOTTOM", "TOP"],
            ["", "BACK", "FRONT"],
        ];
        let mut rest = self.0;
        let mut first = true;
        for names in NAMES {
            let name = names[(rest % 3) as usize];
            rest /= 3;
            if name.is_empty() {
                continue;
            }
            if !first {
                f.write_str("+")?;
            }
            f.write_str(name)?;
            first = false;
        }
        if first {
            f.write_str("NONE")?;
        }
        Ok(())
    }
}
