//! # Per-bin aggregation
//!
//! Single streaming pass over the combined table accumulating, for every
//! populated `(x, y)` bin, the running mean and sum of squared deviations of
//! the temperature (Welford), the running means of the vertical coordinate and
//! of the altitude, and the sample count.
//!
//! ## Overview
//! -----------------
//! [`BinnedAggregate::compute`] runs the whole aggregation stage:
//!
//! 1. keep rows with `lo < orbit < hi`,
//! 2. drop rows whose temperature, horizontal or vertical coordinate is not finite,
//! 3. build the horizontal and vertical [`BinEdges`],
//! 4. accumulate per bin, rows without a bin are discarded,
//! 5. materialize one [`BinStats`] per populated bin, sorted by `(x, y)`.
//!
//! Derived products:
//! * [`BinnedAggregate::buoyancy_frequency`] – N² per bin, computed column by column.
//! * [`BinnedAggregate::grid`] – Dense 2-D field of any [`BinField`].
//! * [`BinnedAggregate::profiles`] – Vertical profiles of selected horizontal bins.
//! * [`BinnedAggregate::column_profile`] – Profile over all horizontal bins.
//!
//! ## Statistics
//! -----------------
//! The standard deviation is the sample estimate (divisor `n - 1`); a bin with a
//! single observation reports `NaN`. Column profiles merge the per-bin
//! accumulators exactly (pairwise update of Chan et al.), so they equal a direct
//! aggregation over the same rows.
//!
//! ## See also
//! ------------
//! * [`crate::stability::buoyancy_frequency_squared`] – N² transform.
//! * [`crate::regrid::regrid`] – Sparse to dense conversion.
use std::collections::BTreeMap;

use itertools::Itertools;

use crate::constants::{FastHashMap, KM_TO_M};
use crate::euvm_errors::EuvmError;
use crate::regrid::{regrid, GriddedField};
use crate::stability::buoyancy_frequency_squared;
use crate::table::CombinedTable;

use super::{edge_count, BinEdges, BinningParams};

/// Integer coordinates of a bin: horizontal index, vertical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinKey {
    pub x: usize,
    pub y: usize,
}

/// Statistics of one populated bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinStats {
    pub key: BinKey,
    /// Horizontal bin midpoint
    pub x_mid: f64,
    /// Vertical bin midpoint
    pub y_mid: f64,
    /// Mean temperature (K)
    pub mean_temp: f64,
    /// Mean of the vertical coordinate (km or Pa)
    pub mean_vertical: f64,
    /// Mean altitude (km), the height coordinate of the stability transform
    pub mean_altitude: f64,
    /// Sample standard deviation of the temperature (K), `NaN` when `count == 1`
    pub std_temp: f64,
    /// Number of observations, always ≥ 1
    pub count: usize,
}

/// Quantity selected when gridding a [`BinnedAggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinField {
    MeanTemperature,
    StdTemperature,
    Count,
    MeanVertical,
    MeanAltitude,
    BuoyancyFrequency,
}

/// One level of a vertical profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub y_index: usize,
    pub y_mid: f64,
    pub mean_temp: f64,
    pub mean_vertical: f64,
    pub mean_altitude: f64,
    pub std_temp: f64,
    pub count: usize,
    /// Squared buoyancy frequency (s⁻²)
    pub n2: f64,
}

/// Vertical profile of one horizontal bin, or of all of them (`x_mid == None`).
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalProfile {
    pub x_mid: Option<f64>,
    /// Levels by increasing vertical bin index
    pub points: Vec<ProfilePoint>,
}

/// Welford accumulator.
#[derive(Debug, Clone, Copy, Default)]
struct RunningStats {
    count: usize,
    mean_temp: f64,
    m2: f64,
    mean_vertical: f64,
    mean_altitude: f64,
}

impl RunningStats {
    fn push(&mut self, temp: f64, vertical: f64, altitude: f64) {
        self.count += 1;
        let n = self.count as f64;

        let delta = temp - self.mean_temp;
        self.mean_temp += delta / n;
        self.m2 += delta * (temp - self.mean_temp);

        self.mean_vertical += (vertical - self.mean_vertical) / n;
        self.mean_altitude += (altitude - self.mean_altitude) / n;
    }

    fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let (na, nb) = (self.count as f64, other.count as f64);
        let n = na + nb;
        let wb = nb / n;

        let delta = other.mean_temp - self.mean_temp;
        self.mean_temp += delta * wb;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.mean_vertical += (other.mean_vertical - self.mean_vertical) * wb;
        self.mean_altitude += (other.mean_altitude - self.mean_altitude) * wb;
        self.count += other.count;
    }

    fn from_bin(bin: &BinStats) -> Self {
        let m2 = if bin.count > 1 {
            bin.std_temp * bin.std_temp * (bin.count - 1) as f64
        } else {
            0.0
        };
        RunningStats {
            count: bin.count,
            mean_temp: bin.mean_temp,
            m2,
            mean_vertical: bin.mean_vertical,
            mean_altitude: bin.mean_altitude,
        }
    }

    fn std(&self) -> f64 {
        if self.count < 2 {
            f64::NAN
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

/// Result of the aggregation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedAggregate {
    params: BinningParams,
    x_edges: BinEdges,
    y_edges: BinEdges,
    bins: Vec<BinStats>,
    rows_binned: usize,
    rows_outside: usize,
}

impl BinnedAggregate {
    /// Filter, bin and aggregate a combined table.
    ///
    /// Arguments
    /// -----------------
    /// * `table`: Combined table of all loaded profiles.
    /// * `params`: Axis choice, bin counts, orbit window and stability constants.
    ///
    /// Return
    /// ----------
    /// * The populated bins sorted by `(x, y)`, or
    /// * [`EuvmError::EmptySelection`] when no row survives the orbit filter, the
    ///   validity filter or the bin edges,
    /// * [`EuvmError::DegenerateBinning`] when the observed vertical range cannot be split.
    ///
    /// See also
    /// ------------
    /// * [`CombinedTable::select_orbits`] / [`CombinedTable::drop_invalid`] – Row filters.
    /// * [`super::VerticalBinning::edges`] – Vertical edge policy.
    pub fn compute(table: &CombinedTable, params: &BinningParams) -> Result<Self, EuvmError> {
        let range = params.orbit_range;
        let selected = table
            .select_orbits(&range)
            .drop_invalid(params.x_axis, &params.vertical);
        if selected.is_empty() {
            return Err(EuvmError::EmptySelection(format!(
                "no valid observation with {} < orbit < {} (out of {} rows)",
                range.lo(),
                range.hi(),
                table.len()
            )));
        }

        let samples: Vec<(f64, f64, f64, f64)> = selected
            .iter()
            .map(|o| {
                (
                    params.x_axis.value(o),
                    params.vertical.value(o),
                    o.alt_temp,
                    o.temp,
                )
            })
            .collect();

        let (y_min, y_max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.1), hi.max(s.1))
            });

        let (x_lo, x_hi) = params.x_axis.domain();
        let x_edges = BinEdges::linspace(x_lo, x_hi, edge_count(params.x_bins)?)?;
        let y_edges = params.vertical.edges(y_min, y_max)?;

        let mut acc: FastHashMap<BinKey, RunningStats> = FastHashMap::default();
        let mut rows_outside = 0;
        for (x, y, altitude, temp) in &samples {
            match (x_edges.assign(*x), y_edges.assign(*y)) {
                (Some(xi), Some(yi)) => acc
                    .entry(BinKey { x: xi, y: yi })
                    .or_default()
                    .push(*temp, *y, *altitude),
                _ => rows_outside += 1,
            }
        }

        if acc.is_empty() {
            return Err(EuvmError::EmptySelection(format!(
                "none of the {} valid rows falls inside the bin edges",
                samples.len()
            )));
        }

        let x_mids = x_edges.midpoints();
        let y_mids = y_edges.midpoints();
        let bins: Vec<BinStats> = acc
            .into_iter()
            .sorted_by_key(|(key, _)| *key)
            .map(|(key, st)| BinStats {
                key,
                x_mid: x_mids[key.x],
                y_mid: y_mids[key.y],
                mean_temp: st.mean_temp,
                mean_vertical: st.mean_vertical,
                mean_altitude: st.mean_altitude,
                std_temp: st.std(),
                count: st.count,
            })
            .collect();

        let rows_binned = samples.len() - rows_outside;
        log::info!(
            "binned {rows_binned} rows by {} x {} into {} bins ({rows_outside} rows outside the edges)",
            params.x_axis,
            params.vertical.short_name(),
            bins.len()
        );

        Ok(BinnedAggregate {
            params: params.clone(),
            x_edges,
            y_edges,
            bins,
            rows_binned,
            rows_outside,
        })
    }

    pub fn params(&self) -> &BinningParams {
        &self.params
    }

    pub fn x_edges(&self) -> &BinEdges {
        &self.x_edges
    }

    pub fn y_edges(&self) -> &BinEdges {
        &self.y_edges
    }

    /// Populated bins sorted by `(x, y)`.
    pub fn bins(&self) -> &[BinStats] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Number of rows that contributed to a bin.
    pub fn rows_binned(&self) -> usize {
        self.rows_binned
    }

    /// Number of valid rows that fell outside the edges.
    pub fn rows_outside(&self) -> usize {
        self.rows_outside
    }

    pub fn get(&self, key: BinKey) -> Option<&BinStats> {
        self.bins
            .binary_search_by_key(&key, |b| b.key)
            .ok()
            .map(|i| &self.bins[i])
    }

    /// Squared buoyancy frequency of every bin.
    ///
    /// The transform runs independently on each horizontal bin, over its
    /// populated vertical bins ordered by increasing mean altitude (km → m).
    ///
    /// Return
    /// ----------
    /// * N² (s⁻²) keyed by bin; `NaN` for columns with a single populated level.
    pub fn buoyancy_frequency(&self) -> Result<BTreeMap<BinKey, f64>, EuvmError> {
        let mut out = BTreeMap::new();
        for (_, group) in &self.bins.iter().chunk_by(|b| b.key.x) {
            let mut column: Vec<&BinStats> = group.collect();
            column.sort_by(|a, b| a.mean_altitude.total_cmp(&b.mean_altitude));

            let heights: Vec<f64> = column.iter().map(|b| b.mean_altitude * KM_TO_M).collect();
            let temps: Vec<f64> = column.iter().map(|b| b.mean_temp).collect();
            let n2 = buoyancy_frequency_squared(&heights, &temps, &self.params.stability)?;

            out.extend(column.iter().map(|b| b.key).zip(n2));
        }
        Ok(out)
    }

    /// Dense grid of one quantity: columns are horizontal midpoints, rows vertical midpoints.
    pub fn grid(&self, field: BinField) -> Result<GriddedField, EuvmError> {
        let n2 = match field {
            BinField::BuoyancyFrequency => self.buoyancy_frequency()?,
            _ => BTreeMap::new(),
        };

        Ok(regrid(self.bins.iter().map(|b| {
            let value = match field {
                BinField::MeanTemperature => b.mean_temp,
                BinField::StdTemperature => b.std_temp,
                BinField::Count => b.count as f64,
                BinField::MeanVertical => b.mean_vertical,
                BinField::MeanAltitude => b.mean_altitude,
                BinField::BuoyancyFrequency => n2.get(&b.key).copied().unwrap_or(f64::NAN),
            };
            (b.x_mid, b.y_mid, value)
        })))
    }

    /// Vertical profiles of every `every_nth` populated horizontal bin, starting with the first.
    pub fn profiles(&self, every_nth: usize) -> Result<Vec<VerticalProfile>, EuvmError> {
        if every_nth == 0 {
            return Err(EuvmError::InvalidBinningParameter(
                "every_nth must be >= 1".into(),
            ));
        }
        let n2 = self.buoyancy_frequency()?;

        let columns = self.bins.iter().chunk_by(|b| b.x_mid);
        let profiles = columns
            .into_iter()
            .step_by(every_nth)
            .map(|(x_mid, group)| VerticalProfile {
                x_mid: Some(x_mid),
                points: group
                    .map(|b| ProfilePoint {
                        y_index: b.key.y,
                        y_mid: b.y_mid,
                        mean_temp: b.mean_temp,
                        mean_vertical: b.mean_vertical,
                        mean_altitude: b.mean_altitude,
                        std_temp: b.std_temp,
                        count: b.count,
                        n2: n2.get(&b.key).copied().unwrap_or(f64::NAN),
                    })
                    .collect(),
            })
            .collect();
        Ok(profiles)
    }

    /// Profile aggregated over all horizontal bins, with its N².
    pub fn column_profile(&self) -> Result<VerticalProfile, EuvmError> {
        let mut levels: BTreeMap<usize, RunningStats> = BTreeMap::new();
        for bin in &self.bins {
            levels
                .entry(bin.key.y)
                .or_default()
                .merge(&RunningStats::from_bin(bin));
        }

        let y_mids = self.y_edges.midpoints();
        let mut points: Vec<ProfilePoint> = levels
            .into_iter()
            .map(|(y, st)| ProfilePoint {
                y_index: y,
                y_mid: y_mids[y],
                mean_temp: st.mean_temp,
                mean_vertical: st.mean_vertical,
                mean_altitude: st.mean_altitude,
                std_temp: st.std(),
                count: st.count,
                n2: f64::NAN,
            })
            .collect();

        let order: Vec<usize> = (0..points.len())
            .sorted_by(|&a, &b| points[a].mean_altitude.total_cmp(&points[b].mean_altitude))
            .collect();
        let heights: Vec<f64> = order
            .iter()
            .map(|&i| points[i].mean_altitude * KM_TO_M)
            .collect();
        let temps: Vec<f64> = order.iter().map(|&i| points[i].mean_temp).collect();
        let n2 = buoyancy_frequency_squared(&heights, &temps, &self.params.stability)?;
        for (&i, v) in order.iter().zip(n2) {
            points[i].n2 = v;
        }

        Ok(VerticalProfile {
            x_mid: None,
            points,
        })
    }
}

#[cfg(test)]
mod test_running_stats {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_welford_matches_two_pass() {
        let temps = [140.0, 155.5, 149.25, 171.0, 160.0];
        let mut st = RunningStats::default();
        for t in temps {
            st.push(t, 0.0, 0.0);
        }
        let mean = temps.iter().sum::<f64>() / 5.0;
        let var = temps.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / 4.0;
        assert_relative_eq!(st.mean_temp, mean, epsilon = 1e-12);
        assert_relative_eq!(st.std(), var.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_single_sample_std_is_nan() {
        let mut st = RunningStats::default();
        st.push(150.0, 100.0, 100.0);
        assert!(st.std().is_nan());
        assert_eq!(st.count, 1);
    }

    #[test]
    fn test_merge_equals_direct() {
        let a = [130.0, 135.0, 150.0];
        let b = [160.0, 171.0];
        let mut sa = RunningStats::default();
        let mut sb = RunningStats::default();
        let mut all = RunningStats::default();
        for (i, t) in a.iter().enumerate() {
            sa.push(*t, i as f64, 100.0 + i as f64);
            all.push(*t, i as f64, 100.0 + i as f64);
        }
        for (i, t) in b.iter().enumerate() {
            sb.push(*t, 10.0 + i as f64, 120.0);
            all.push(*t, 10.0 + i as f64, 120.0);
        }
        sa.merge(&sb);
        assert_eq!(sa.count, all.count);
        assert_relative_eq!(sa.mean_temp, all.mean_temp, epsilon = 1e-12);
        assert_relative_eq!(sa.std(), all.std(), epsilon = 1e-12);
        assert_relative_eq!(sa.mean_vertical, all.mean_vertical, epsilon = 1e-12);
        assert_relative_eq!(sa.mean_altitude, all.mean_altitude, epsilon = 1e-12);
    }
}
