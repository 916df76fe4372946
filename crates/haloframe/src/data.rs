//! Named per-partition simulation data and the registry that owns it.
//!
//! A driver keeps everything it resets between runs in one [`DataSet`]:
//! particle species as [`SimulationData::Particles`], grid-aligned scalars
//! as [`SimulationData::Field`].

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

use haloframe_core::SupercellCoord;
use haloframe_grid::GridLayout;
use haloframe_particles::ParticlesBase;

// ── FieldData ──────────────────────────────────────────────────────

/// A scalar per cell, stored supercell by supercell.
///
/// Cell `(x, y, z)` of supercell `s` lives at
/// `s * tile_volume + x + sx * (y + sy * z)`, where `(sx, sy, _)` is the
/// supercell size, so each supercell's cells are contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldData {
    name: String,
    layout: GridLayout,
    values: Vec<f32>,
}

impl FieldData {
    /// A zero-filled field over every cell of `layout`.
    pub fn new(name: impl Into<String>, layout: GridLayout) -> Self {
        let len = layout.supercell_count() * layout.tile_volume() as usize;
        Self {
            name: name.into(),
            layout,
            values: vec![0.0; len],
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid the field is laid out over.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the field has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat index of a cell.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the grid or `cell` outside the supercell.
    pub fn cell_index(&self, coord: SupercellCoord, cell: [u32; 3]) -> usize {
        let size = self.layout.supercell_size();
        assert!(
            (0..3).all(|a| cell[a] < size[a]),
            "cell {cell:?} outside supercell of size {size:?}"
        );
        let local = cell[0] + size[0] * (cell[1] + size[1] * cell[2]);
        self.layout.index(coord) * self.layout.tile_volume() as usize + local as usize
    }

    /// Value of one cell.
    pub fn get(&self, coord: SupercellCoord, cell: [u32; 3]) -> f32 {
        self.values[self.cell_index(coord, cell)]
    }

    /// Overwrite one cell.
    pub fn set(&mut self, coord: SupercellCoord, cell: [u32; 3], value: f32) {
        let i = self.cell_index(coord, cell);
        self.values[i] = value;
    }

    /// All cells of one supercell.
    pub fn supercell(&self, coord: SupercellCoord) -> &[f32] {
        let tile = self.layout.tile_volume() as usize;
        let start = self.layout.index(coord) * tile;
        &self.values[start..start + tile]
    }

    /// Raw values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Raw values, mutable.
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: f32) {
        self.values.fill(value);
    }
}

// ── SimulationData ─────────────────────────────────────────────────

/// One named piece of per-partition state.
pub enum SimulationData {
    /// A particle species.
    Particles {
        /// Species name.
        name: String,
        /// The species' buffer and worker pool.
        base: ParticlesBase,
    },
    /// A scalar grid field.
    Field(FieldData),
}

impl SimulationData {
    /// Wrap a particle species.
    pub fn particles(name: impl Into<String>, base: ParticlesBase) -> Self {
        Self::Particles {
            name: name.into(),
            base,
        }
    }

    /// Registry key.
    pub fn name(&self) -> &str {
        match self {
            Self::Particles { name, .. } => name,
            Self::Field(field) => field.name(),
        }
    }

    /// Return to the state at construction. Particles go back to the heap;
    /// fields are zeroed.
    ///
    /// # Panics
    ///
    /// Panics if a particle dispatch is outstanding.
    pub fn reset(&mut self, step: u64) {
        match self {
            Self::Particles { base, .. } => base.reset(step),
            Self::Field(field) => field.fill(0.0),
        }
    }
}

impl fmt::Debug for SimulationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Particles { name, base } => f
                .debug_struct("Particles")
                .field("name", name)
                .field("particles", &base.total_particles())
                .field("poisoned", &base.is_poisoned())
                .finish(),
            Self::Field(field) => f
                .debug_struct("Field")
                .field("name", &field.name)
                .field("cells", &field.len())
                .finish(),
        }
    }
}

// ── DataSet ────────────────────────────────────────────────────────

/// Errors from [`DataSet`] registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataError {
    /// An entry with this name is already registered.
    DuplicateName {
        /// The clashing name.
        name: String,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "data '{name}' already registered"),
        }
    }
}

impl Error for DataError {}

/// Registry of named simulation data, in registration order.
#[derive(Debug, Default)]
pub struct DataSet {
    entries: IndexMap<String, SimulationData>,
}

impl DataSet {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` under its own name.
    pub fn insert(&mut self, data: SimulationData) -> Result<(), DataError> {
        let name = data.name().to_owned();
        if self.entries.contains_key(&name) {
            return Err(DataError::DuplicateName { name });
        }
        log::debug!("data set: registered '{name}'");
        self.entries.insert(name, data);
        Ok(())
    }

    /// Unregister and return an entry, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<SimulationData> {
        self.entries.shift_remove(name)
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&SimulationData> {
        self.entries.get(name)
    }

    /// Look up an entry mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SimulationData> {
        self.entries.get_mut(name)
    }

    /// A particle species by name.
    pub fn particles(&self, name: &str) -> Option<&ParticlesBase> {
        match self.entries.get(name)? {
            SimulationData::Particles { base, .. } => Some(base),
            SimulationData::Field(_) => None,
        }
    }

    /// A field by name.
    pub fn field(&self, name: &str) -> Option<&FieldData> {
        match self.entries.get(name)? {
            SimulationData::Field(field) => Some(field),
            SimulationData::Particles { .. } => None,
        }
    }

    /// A field by name, mutable.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldData> {
        match self.entries.get_mut(name)? {
            SimulationData::Field(field) => Some(field),
            SimulationData::Particles { .. } => None,
        }
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SimulationData> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reset every entry, in registration order.
    pub fn reset_all(&mut self, step: u64) {
        for data in self.entries.values_mut() {
            data.reset(step);
        }
        log::info!("data set: {} entries reset at step {step}", self.entries.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haloframe_core::Particle;
    use haloframe_grid::GridConfig;
    use haloframe_heap::HeapConfig;
    use haloframe_particles::ParticlesConfig;

    fn grid() -> GridConfig {
        GridConfig::new_2d([2, 2], [2, 2])
    }

    fn species() -> ParticlesBase {
        let config = ParticlesConfig::new(grid())
            .with_heap(HeapConfig::new(8))
            .with_workers(1);
        ParticlesBase::new(config).unwrap()
    }

    fn field(name: &str) -> FieldData {
        FieldData::new(name, GridLayout::new(&grid()).unwrap())
    }

    #[test]
    fn field_cells_are_grouped_by_supercell() {
        let mut f = field("rho");
        assert_eq!(f.len(), 16 * 4);
        let c = SupercellCoord::new(1, 2, 0);
        f.set(c, [1, 1, 0], 3.0);
        assert_eq!(f.get(c, [1, 1, 0]), 3.0);
        assert_eq!(f.supercell(c), &[0.0, 0.0, 0.0, 3.0]);
        assert_eq!(f.cell_index(c, [0, 0, 0]), 9 * 4);
    }

    #[test]
    #[should_panic(expected = "outside supercell")]
    fn cell_outside_supercell_panics() {
        field("rho").get(SupercellCoord::new(0, 0, 0), [2, 0, 0]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut set = DataSet::new();
        set.insert(SimulationData::Field(field("e"))).unwrap();
        assert_eq!(
            set.insert(SimulationData::Field(field("e"))),
            Err(DataError::DuplicateName { name: "e".into() })
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn reset_all_clears_particles_and_fields() {
        let mut set = DataSet::new();
        set.insert(SimulationData::particles("electrons", species()))
            .unwrap();
        set.insert(SimulationData::Field(field("rho"))).unwrap();

        let c = SupercellCoord::new(1, 1, 0);
        set.particles("electrons")
            .unwrap()
            .device_box()
            .append(c, Particle::new(0, [0.5, 0.5, 0.0]))
            .unwrap();
        set.field_mut("rho").unwrap().fill(1.5);

        set.reset_all(10);
        let electrons = set.particles("electrons").unwrap();
        assert_eq!(electrons.total_particles(), 0);
        assert_eq!(electrons.heap_stats().in_use, 0);
        assert!(set.field("rho").unwrap().values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn lookups_respect_variant_and_order() {
        let mut set = DataSet::new();
        set.insert(SimulationData::Field(field("b"))).unwrap();
        set.insert(SimulationData::particles("a", species())).unwrap();
        assert!(set.particles("b").is_none());
        assert!(set.field("a").is_none());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(set.remove("b").is_some());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["a"]);
    }
}
