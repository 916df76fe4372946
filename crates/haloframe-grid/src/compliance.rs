//! Mapper contract test helpers.
//!
//! Used by the mapping tests: a set of passes must cover
//! the requested area exactly once, and supercells within one pass must be
//! far enough apart that their neighbourhoods never overlap.

use haloframe_core::SupercellCoord;
use indexmap::IndexSet;

use crate::area::AreaMask;
use crate::layout::GridLayout;
use crate::mapping::find_close_pair;

/// Assert that the union of `passes` is exactly the supercells of `area`,
/// with no supercell visited twice.
pub fn assert_covers_exactly_once(
    layout: &GridLayout,
    area: AreaMask,
    passes: &[Vec<SupercellCoord>],
) {
    let mut seen: IndexSet<SupercellCoord> = IndexSet::new();
    for (p, pass) in passes.iter().enumerate() {
        for &c in pass {
            assert!(
                layout.in_area(c, area),
                "pass {p} visits {c} which is not in {area}"
            );
            assert!(seen.insert(c), "{c} visited twice (again in pass {p})");
        }
    }
    let expected = layout.supercells_in(area);
    assert_eq!(
        seen.len(),
        expected.len(),
        "passes cover {} supercells, {area} has {}",
        seen.len(),
        expected.len()
    );
}

/// Assert that any two distinct supercells of the same pass are at least
/// `min_distance` apart along some axis.
pub fn assert_passes_non_adjacent(passes: &[Vec<SupercellCoord>], min_distance: u32) {
    if let Some((p, a, b)) = find_close_pair(passes, min_distance) {
        panic!("pass {p}: {a} and {b} are closer than {min_distance}");
    }
}
