//! Progress reporting for batch loads (feature `progress`).
//!
//! The bar shows the current file, the time spent on it and an exponential
//! moving average of the per-file time (`ema ← α·dt + (1–α)·ema`, seeded by
//! the first file).
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const EMA_ALPHA: f64 = 0.2;

/// Compact duration: `"253µs"`, `"42ms"`, `"3.14s"`.
pub(crate) fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}

/// Progress bar over the files of a batch load.
pub(crate) struct LoadProgress {
    bar: ProgressBar,
    last: Instant,
    ema_ns: Option<f64>,
}

impl LoadProgress {
    pub(crate) fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total.max(1) as u64);
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} files | ETA {eta_precise} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(200));
        LoadProgress {
            bar,
            last: Instant::now(),
            ema_ns: None,
        }
    }

    /// Record the time since the previous file and return it with the updated average.
    fn tick(&mut self) -> (Duration, Duration) {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;

        let dt_ns = dt.as_nanos() as f64;
        let ema = match self.ema_ns {
            None => dt_ns,
            Some(prev) => EMA_ALPHA * dt_ns + (1.0 - EMA_ALPHA) * prev,
        };
        self.ema_ns = Some(ema);
        (dt, Duration::from_nanos(ema as u64))
    }

    /// Mark one file as processed.
    pub(crate) fn file_done(&mut self, name: &str) {
        let (last, avg) = self.tick();
        self.bar.set_message(format!(
            "{name} | last: {}, avg: {}",
            fmt_dur(last),
            fmt_dur(avg)
        ));
        self.bar.inc(1);
    }

    pub(crate) fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod test_progress {
    use super::*;

    #[test]
    fn test_fmt_dur_scales() {
        assert_eq!(fmt_dur(Duration::from_micros(253)), "253µs");
        assert_eq!(fmt_dur(Duration::from_millis(42)), "42ms");
        assert_eq!(fmt_dur(Duration::from_millis(3140)), "3.14s");
    }

    #[test]
    fn test_first_tick_seeds_average() {
        let mut progress = LoadProgress::new(2);
        let (last, avg) = progress.tick();
        assert_eq!(avg.as_nanos(), last.as_nanos());
        progress.file_done("temp_800in_v01r00.sav");
        progress.finish();
    }
}
