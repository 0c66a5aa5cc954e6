//! # Combined table: ingestion, filtering and CSV exchange
//!
//! The [`CombinedTable`] is the concatenation of the per-file record tables,
//! **stably sorted by orbit number** (rows without an orbit go last). It is the
//! input of the aggregation stage and the only artifact persisted by the
//! pipeline (as the combined CSV).
//!
//! Modules
//! -----------------
//! * [`batch_loader`] – Load many save files with per-file failure isolation.
//! * [`csv_io`] – Combined CSV export/import.
//! * *(crate-private)* `progress_bar` – Optional progress UI when the `progress` feature is enabled.
//!
//! Filters
//! -----------------
//! * [`CombinedTable::select_orbits`] – Keep `lo < orbit < hi`.
//! * [`CombinedTable::drop_invalid`] – Keep rows with finite temperature and
//!   finite coordinates on the chosen axes.
//!
//! Both return a new table; the source is never modified.
use crate::binning::{HorizontalAxis, OrbitRange, VerticalBinning};
use crate::observations::Observation;

pub mod batch_loader;
pub mod csv_io;

#[cfg(feature = "progress")]
pub(crate) mod progress_bar;

/// All observations of a run, sorted by orbit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedTable {
    rows: Vec<Observation>,
}

impl CombinedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate record tables and sort the result by orbit.
    ///
    /// Arguments
    /// -----------------
    /// * `tables`: One record table per file, in any order.
    ///
    /// Return
    /// ----------
    /// * The combined table. Rows of equal orbit keep their input order.
    pub fn from_tables<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Vec<Observation>>,
    {
        let mut table = CombinedTable {
            rows: tables.into_iter().flatten().collect(),
        };
        table.sort_by_orbit();
        table
    }

    /// Append one record table, keeping the orbit order.
    pub fn append(&mut self, rows: Vec<Observation>) {
        self.rows.extend(rows);
        self.sort_by_orbit();
    }

    fn sort_by_orbit(&mut self) {
        self.rows.sort_by_key(|o| (o.orbit.is_none(), o.orbit));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    /// Distinct orbit numbers present, ascending.
    pub fn orbits(&self) -> Vec<u32> {
        let mut orbits: Vec<u32> = self.rows.iter().filter_map(|o| o.orbit).collect();
        orbits.dedup();
        orbits
    }

    /// Rows with `lo < orbit < hi`. Rows without an orbit are removed.
    pub fn select_orbits(&self, range: &OrbitRange) -> CombinedTable {
        let rows: Vec<Observation> = self
            .rows
            .iter()
            .filter(|o| range.contains(o.orbit))
            .cloned()
            .collect();
        log::debug!(
            "orbit filter {}..{}: kept {} of {} rows",
            range.lo(),
            range.hi(),
            rows.len(),
            self.rows.len()
        );
        CombinedTable { rows }
    }

    /// Rows whose temperature and coordinates on `axis` and `vertical` are finite.
    pub fn drop_invalid(&self, axis: HorizontalAxis, vertical: &VerticalBinning) -> CombinedTable {
        let rows: Vec<Observation> = self
            .rows
            .iter()
            .filter(|o| {
                o.temp.is_finite() && axis.value(o).is_finite() && vertical.value(o).is_finite()
            })
            .cloned()
            .collect();
        log::debug!(
            "dropped {} rows with missing values",
            self.rows.len() - rows.len()
        );
        CombinedTable { rows }
    }
}

impl FromIterator<Observation> for CombinedTable {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        Self::from_tables(std::iter::once(iter.into_iter().collect()))
    }
}

impl<'a> IntoIterator for &'a CombinedTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
