//! Tabular rendering of a [`BinnedAggregate`].
//!
//! `{}` prints a one-line summary, `{:#}` the full per-bin table
//! (via [`comfy-table`](https://docs.rs/comfy-table/latest/comfy_table/)).
use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};

use super::aggregate::BinnedAggregate;

/// Fixed-point cell, blank for `NaN`.
fn num_cell(v: f64, prec: usize) -> Cell {
    let text = if v.is_nan() {
        String::new()
    } else {
        format!("{v:.prec$}")
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Scientific cell, used for pressures.
fn sci_cell(v: f64) -> Cell {
    let text = if v.is_nan() {
        String::new()
    } else {
        format!("{v:.3e}")
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

impl BinnedAggregate {
    fn render_table(&self) -> String {
        let params = self.params();
        let log_y = params.vertical.is_log_scale();

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        // Header
        table.set_header(vec![
            Cell::new("#"),
            Cell::new(params.x_axis.label()),
            Cell::new(params.vertical.label()),
            Cell::new("T mean [K]"),
            Cell::new("T std [K]"),
            Cell::new("Alt mean [km]"),
            Cell::new("N"),
        ]);

        // Rows
        for (i, b) in self.bins().iter().enumerate() {
            let y = if log_y {
                sci_cell(b.y_mid)
            } else {
                num_cell(b.y_mid, 2)
            };
            table.add_row(Row::from(vec![
                Cell::new(i).set_alignment(CellAlignment::Right),
                num_cell(b.x_mid, 2),
                y,
                num_cell(b.mean_temp, 2),
                num_cell(b.std_temp, 2),
                num_cell(b.mean_altitude, 2),
                Cell::new(b.count).set_alignment(CellAlignment::Right),
            ]));
        }

        table.to_string()
    }
}

impl fmt::Display for BinnedAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params();
        writeln!(
            f,
            "BinnedAggregate: {} bins over {} x {} ({} rows binned, {} outside, orbits {}..{})",
            self.len(),
            params.x_axis,
            params.vertical.short_name(),
            self.rows_binned(),
            self.rows_outside(),
            params.orbit_range.lo(),
            params.orbit_range.hi(),
        )?;
        if f.alternate() {
            write!(f, "{}", self.render_table())?;
        }
        Ok(())
    }
}
