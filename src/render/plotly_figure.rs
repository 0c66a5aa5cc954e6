//! Interactive HTML rendering of a [`StabilityFigure`] with `plotly`.
//!
//! Top row: filled contours of the four panels, with dashed vertical lines at
//! the horizontal positions whose profiles are drawn below. Bottom row: the
//! temperature, standard deviation and N² profiles of those positions, and the
//! number of profiles per level over all horizontal bins.
use camino::Utf8PathBuf;
use plotly::common::{ColorScale, ColorScalePalette, DashType, Line, Mode, Title};
use plotly::contour::Contours;
use plotly::layout::{Axis, AxisType, GridPattern, Layout, LayoutGrid};
use plotly::{Contour, Plot, Scatter};

use crate::euvm_errors::EuvmError;

use super::{Presenter, ProfilePoint, StabilityFigure, N2_DISPLAY_SCALE};

const PROFILE_COLORS: [&str; 9] = [
    "black",
    "gray",
    "cyan",
    "blue",
    "red",
    "lightcoral",
    "darkorange",
    "purple",
    "gold",
];

const CONTOUR_LEVELS: f64 = 20.0;

/// Writes the figure as a standalone HTML file and optionally opens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotlyPresenter {
    output: Utf8PathBuf,
    show: bool,
}

impl PlotlyPresenter {
    /// Arguments
    /// -----------------
    /// * `output`: HTML destination.
    /// * `show`: Open the figure in the browser after writing it.
    pub fn new(output: impl Into<Utf8PathBuf>, show: bool) -> Self {
        PlotlyPresenter {
            output: output.into(),
            show,
        }
    }
}

fn axis_ids(panel: usize) -> (String, String) {
    if panel == 0 {
        ("x".into(), "y".into())
    } else {
        (format!("x{}", panel + 1), format!("y{}", panel + 1))
    }
}

fn range_axis(title: &str, limits: (f64, f64), log: bool) -> Axis {
    let axis = Axis::new().title(Title::with_text(title));
    if log {
        axis.type_(AxisType::Log)
            .range(vec![limits.0.log10(), limits.1.log10()])
    } else {
        axis.range(vec![limits.0, limits.1])
    }
}

fn with_axes(layout: Layout, panel: usize, x: Axis, y: Axis) -> Layout {
    match panel {
        0 => layout.x_axis(x).y_axis(y),
        1 => layout.x_axis2(x).y_axis2(y),
        2 => layout.x_axis3(x).y_axis3(y),
        3 => layout.x_axis4(x).y_axis4(y),
        4 => layout.x_axis5(x).y_axis5(y),
        5 => layout.x_axis6(x).y_axis6(y),
        6 => layout.x_axis7(x).y_axis7(y),
        _ => layout.x_axis8(x).y_axis8(y),
    }
}

fn profile_trace(
    panel: usize,
    name: &str,
    color: &'static str,
    points: &[ProfilePoint],
    value: impl Fn(&ProfilePoint) -> f64,
) -> Box<Scatter<f64, f64>> {
    let (xa, ya) = axis_ids(panel);
    Scatter::new(
        points.iter().map(&value).collect(),
        points.iter().map(|p| p.y_mid).collect(),
    )
    .mode(Mode::Lines)
    .name(name)
    .legend_group(name)
    .show_legend(panel == 4)
    .line(Line::new().color(color))
    .x_axis(&xa)
    .y_axis(&ya)
}

impl StabilityFigure {
    /// Build the plotly figure.
    pub fn to_plot(&self) -> Plot {
        let mut plot = Plot::new();
        let log_y = self.vertical.is_log_scale();
        let y_limits = self.vertical.plot_limits();
        let x_limits = self.x_axis.plot_limits();
        let mut layout = Layout::new()
            .title(Title::with_text(format!(
                "EUVM binned by {} and {}",
                self.x_axis.short_name(),
                self.vertical.short_name()
            )))
            .grid(
                LayoutGrid::new()
                    .rows(2)
                    .columns(4)
                    .pattern(GridPattern::Independent),
            )
            .width(2200)
            .height(1000);

        for (panel, p) in self.panels().into_iter().enumerate() {
            let (xa, ya) = axis_ids(panel);
            let size = (p.range.1 - p.range.0) / CONTOUR_LEVELS;
            plot.add_trace(
                Contour::new(p.field.x.clone(), p.field.y.clone(), p.field.rows())
                    .name(p.label)
                    .color_scale(ColorScale::Palette(ColorScalePalette::Viridis))
                    .contours(Contours::new().start(p.range.0).end(p.range.1).size(size))
                    .show_scale(false)
                    .x_axis(&xa)
                    .y_axis(&ya),
            );

            if panel < 3 {
                for (k, profile) in self.profiles.iter().enumerate() {
                    let Some(x) = profile.x_mid else { continue };
                    let color = PROFILE_COLORS[k % PROFILE_COLORS.len()];
                    plot.add_trace(
                        Scatter::new(vec![x, x], vec![y_limits.0, y_limits.1])
                            .mode(Mode::Lines)
                            .show_legend(false)
                            .line(Line::new().color(color).dash(DashType::Dash))
                            .x_axis(&xa)
                            .y_axis(&ya),
                    );
                }
            }

            layout = with_axes(
                layout,
                panel,
                range_axis(self.x_axis.label(), x_limits, false),
                range_axis(self.vertical.label(), y_limits, log_y),
            );
        }

        for (k, profile) in self.profiles.iter().enumerate() {
            let color = PROFILE_COLORS[k % PROFILE_COLORS.len()];
            let name = profile
                .x_mid
                .map(|x| format!("{} {x:.1}", self.x_axis.short_name()))
                .unwrap_or_else(|| "all".into());
            plot.add_trace(profile_trace(4, &name, color, &profile.points, |p| {
                p.mean_temp
            }));
            plot.add_trace(profile_trace(5, &name, color, &profile.points, |p| {
                p.std_temp
            }));
            plot.add_trace(profile_trace(6, &name, color, &profile.points, |p| {
                p.n2 * N2_DISPLAY_SCALE
            }));
        }
        plot.add_trace(profile_trace(
            7,
            "all",
            "black",
            &self.column.points,
            |p| p.count as f64,
        ));

        let [t, s, n2, count] = self.panels();
        for (panel, p) in [(4, t), (5, s), (6, n2), (7, count)] {
            layout = with_axes(
                layout,
                panel,
                range_axis(p.label, p.range, false),
                range_axis(self.vertical.label(), y_limits, log_y),
            );
        }

        plot.set_layout(layout);
        plot
    }
}

impl Presenter for PlotlyPresenter {
    fn present(&self, figure: &StabilityFigure) -> Result<(), EuvmError> {
        let failed = |e: std::io::Error| EuvmError::Presenter(format!("{}: {e}", self.output));
        if let Some(parent) = self.output.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }
        let plot = figure.to_plot();
        std::fs::write(&self.output, plot.to_html()).map_err(failed)?;
        log::info!("figure written to {}", self.output);
        if self.show {
            plot.show();
        }
        Ok(())
    }
}
